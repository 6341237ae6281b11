//! MSVC symbol undecoration
//!
//! Decorated type names read from a type descriptor look like
//! `?Widget@ui@@`. Undecoration never fails a scan: when a name cannot be
//! undecorated the decorated form is returned unchanged.

use msvc_demangler::DemangleFlags;
use tracing::warn;

/// Host capability turning a decorated name into a display name
pub trait SymbolUndecorator: Send + Sync {
    /// Returns the display name, or `mangled` unchanged on failure
    fn undecorate(&self, mangled: &str) -> String;
}

impl<F> SymbolUndecorator for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn undecorate(&self, mangled: &str) -> String {
        self(mangled)
    }
}

/// Name-only undecorator for MSVC type names
#[derive(Debug, Clone, Copy, Default)]
pub struct MsvcUndecorator;

impl SymbolUndecorator for MsvcUndecorator {
    fn undecorate(&self, mangled: &str) -> String {
        match msvc_demangler::demangle(mangled, DemangleFlags::NAME_ONLY) {
            Ok(name) if !name.is_empty() => name,
            Ok(_) => mangled.to_string(),
            Err(e) => {
                warn!("Could not undecorate {}: {}", mangled, e);
                mangled.to_string()
            }
        }
    }
}
