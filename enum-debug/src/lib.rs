pub use enum_debug_derive::EnumDebug;

/// Returns the name of an enum's active variant.
pub trait EnumDebug {
    /// Returns the name of the currently active variant, as a string.
    fn variant(&self) -> &'static str;
}
