//! String module.
//!
//! Offsets and lengths are in bytes, matching how the guest runtime indexes
//! strings.

use tether_core::{NativeError, Value};
use tether_macros::function;
use tether_registry::NativeModule;

#[function]
pub fn tether_strlen(string: String) -> i64 {
    string.len() as i64
}

/// Largest string `str_repeat` will build.
pub const MAX_REPEAT_BYTES: usize = 256 * 1024 * 1024;

/// Repeat `string`; a non-positive count yields the empty string.
#[function]
pub fn tether_str_repeat(string: String, #[optional("2")] times: i64) -> Result<String, NativeError> {
    let Ok(times) = usize::try_from(times) else {
        return Ok(String::new());
    };
    match string.len().checked_mul(times) {
        Some(len) if len <= MAX_REPEAT_BYTES => Ok(string.repeat(times)),
        _ => Err(NativeError::failed(format!(
            "result of repeating {} bytes {times} times exceeds {MAX_REPEAT_BYTES} bytes",
            string.len()
        ))),
    }
}

#[function]
pub fn tether_strtoupper(string: String) -> String {
    string.to_uppercase()
}

#[function]
pub fn tether_strtolower(string: String) -> String {
    string.to_lowercase()
}

/// Trim whitespace, or the given characters when `chars` is passed.
#[function]
pub fn tether_trim(string: String, #[optional] chars: Option<String>) -> String {
    match chars {
        Some(chars) => string.trim_matches(|c: char| chars.contains(c)).to_string(),
        None => string.trim().to_string(),
    }
}

/// Join the pieces with `glue`. A single array argument is joined element-wise.
#[function]
pub fn tether_implode(glue: String, pieces: Vec<Value>) -> String {
    let pieces = match <[Value; 1]>::try_from(pieces) {
        Ok([Value::Array(items)]) => items,
        Ok(single) => Vec::from(single),
        Err(pieces) => pieces,
    };
    pieces
        .iter()
        .map(Value::to_string_value)
        .collect::<Vec<_>>()
        .join(&glue)
}

/// Byte position of `needle` at or after `offset`; `false` when absent.
#[function(null_as_false)]
pub fn tether_strpos(haystack: String, needle: String, #[optional("0")] offset: i64) -> Option<i64> {
    let len = haystack.len() as i64;
    let start = if offset < 0 { len + offset } else { offset };
    if start < 0 || start > len {
        return None;
    }
    let start = start as usize;
    haystack
        .get(start..)?
        .find(needle.as_str())
        .map(|pos| (pos + start) as i64)
}

/// Reverse a string; passing null is an error.
#[function(name = "strrev")]
pub fn reverse(#[not_null] string: Option<String>) -> String {
    string.unwrap_or_default().chars().rev().collect()
}

/// Creates the string module.
pub fn module() -> NativeModule {
    NativeModule::new("string")
        .function(tether_core::decl!(tether_strlen))
        .function(tether_core::decl!(tether_str_repeat))
        .function(tether_core::decl!(tether_strtoupper))
        .function(tether_core::decl!(tether_strtolower))
        .function(tether_core::decl!(tether_trim))
        .function(tether_core::decl!(tether_implode))
        .function(tether_core::decl!(tether_strpos))
        .function(tether_core::decl!(reverse))
        .constant("STR_PAD_RIGHT", 1_i32)
        .constant("STR_PAD_LEFT", 0_i32)
        .extension("standard")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strlen() {
        assert_eq!(tether_strlen("hello".into()), 5);
        assert_eq!(tether_strlen(String::new()), 0);
    }

    #[test]
    fn test_str_repeat() {
        assert_eq!(tether_str_repeat("ab".into(), 3), Ok("ababab".to_string()));
        assert_eq!(tether_str_repeat("ab".into(), -1), Ok(String::new()));
        assert_eq!(tether_str_repeat(String::new(), i64::MAX), Ok(String::new()));

        let err = tether_str_repeat("ab".into(), i64::MAX).unwrap_err();
        assert!(err.to_string().contains("exceeds"), "{err}");
        assert!(tether_str_repeat("x".into(), (MAX_REPEAT_BYTES + 1) as i64).is_err());
    }

    #[test]
    fn test_trim() {
        assert_eq!(tether_trim("  x ".into(), None), "x");
        assert_eq!(tether_trim("--x-".into(), Some("-".into())), "x");
    }

    #[test]
    fn test_implode() {
        let pieces = vec![Value::Long(1), Value::from("a"), Value::Bool(true)];
        assert_eq!(tether_implode(",".into(), pieces), "1,a,1");

        let array = vec![Value::Array(vec![Value::from("x"), Value::from("y")])];
        assert_eq!(tether_implode("-".into(), array), "x-y");
    }

    #[test]
    fn test_strpos() {
        assert_eq!(tether_strpos("hello".into(), "l".into(), 0), Some(2));
        assert_eq!(tether_strpos("hello".into(), "l".into(), 3), Some(3));
        assert_eq!(tether_strpos("hello".into(), "o".into(), -2), Some(4));
        assert_eq!(tether_strpos("hello".into(), "z".into(), 0), None);
        assert_eq!(tether_strpos("hello".into(), "h".into(), 9), None);
    }

    #[test]
    fn test_module_creates() {
        let m = module();
        assert_eq!(m.name, "string");
        assert_eq!(m.functions.len(), 8);
        assert!(tether_core::decl!(tether_strpos).null_as_false);
        assert_eq!(tether_core::decl!(reverse).guest_name(), "strrev");
    }
}
