#![forbid(unsafe_code)]

//! Pluggable content sanitizers.
//!
//! A sanitizer maps caller-supplied content to what is stored and
//! rendered. It is a formatting strategy, not a security boundary.

use std::fmt;

/// String-to-string content transform.
pub trait Sanitizer: fmt::Debug {
    fn sanitize(&self, input: &str) -> String;
}

/// Leaves content untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct Identity;

impl Sanitizer for Identity {
    fn sanitize(&self, input: &str) -> String {
        input.to_string()
    }
}

/// Escapes HTML metacharacters so content renders as text.
#[derive(Debug, Default, Clone, Copy)]
pub struct EscapeHtml;

impl Sanitizer for EscapeHtml {
    fn sanitize(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        for ch in input.chars() {
            match ch {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#39;"),
                _ => out.push(ch),
            }
        }
        out
    }
}

/// Adapter turning a closure into a [`Sanitizer`].
pub struct FnSanitizer<F>(pub F);

impl<F> fmt::Debug for FnSanitizer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnSanitizer")
    }
}

impl<F: Fn(&str) -> String> Sanitizer for FnSanitizer<F> {
    fn sanitize(&self, input: &str) -> String {
        (self.0)(input)
    }
}
