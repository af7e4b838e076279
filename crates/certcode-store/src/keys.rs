//! Key encoding utilities for `RocksDB`.

use certcode_core::Code;

/// Create a record key from a code.
///
/// Codes are restricted to ASCII, so the key is the code's bytes and sorts the
/// same way the codes do. Generated ULID codes therefore iterate in issuance
/// order.
#[must_use]
pub fn code_key(code: &Code) -> Vec<u8> {
    code.as_str().as_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_key_is_code_bytes() {
        let code = Code::parse("validcode123").unwrap();
        assert_eq!(code_key(&code), b"validcode123".to_vec());
    }

    #[test]
    fn generated_codes_sort_by_issuance() {
        let first = Code::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = Code::generate();
        assert!(code_key(&first) < code_key(&second));
    }
}
