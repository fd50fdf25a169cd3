//! 条码字符串规范化：去除首尾空白，只接受 1~128 位可打印 ASCII。

use once_cell::sync::Lazy;
use regex::Regex;

use super::BarcodeError;

static PRINTABLE_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\x21-\x7E](?:[\x20-\x7E]{0,126}[\x21-\x7E])?$").expect("barcode regex is valid")
});

pub fn normalize_code(raw: &str) -> Result<String, BarcodeError> {
    let trimmed = raw.trim();
    if PRINTABLE_CODE.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(BarcodeError::InvalidCode(format!("{:?}", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(normalize_code("  4006381333931\r\n").unwrap(), "4006381333931");
    }

    #[test]
    fn accepts_code128_payloads_with_inner_spaces() {
        assert_eq!(normalize_code("ABC 123-x").unwrap(), "ABC 123-x");
    }

    #[test]
    fn rejects_empty_and_control_characters() {
        assert!(normalize_code("").is_err());
        assert!(normalize_code("   ").is_err());
        assert!(normalize_code("12\u{7}34").is_err());
        assert!(normalize_code("条码").is_err());
    }

    #[test]
    fn rejects_overlong_codes() {
        assert!(normalize_code(&"9".repeat(128)).is_ok());
        assert!(normalize_code(&"9".repeat(129)).is_err());
    }
}
