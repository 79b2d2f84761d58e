// SPDX-FileCopyrightText: 2026 umdkit contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::ffi::CString;

use crate::{Error, Result};

/// Encodes `str` as UTF-8 with a nul terminator.
pub(crate) fn write_string(str: &str) -> Result<Vec<u8>> {
    let c_string = CString::new(str)
        .map_err(|_| Error::invalid(format!("string {str:?} contains a nul byte")))?;
    Ok(c_string.as_bytes_with_nul().to_vec())
}

/// Formats floats the way the engine's XML parser expects them, separated by a single space.
#[cfg_attr(not(feature = "material_export"), allow(dead_code))]
pub(crate) fn write_float_list(values: &[f32]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    // "FOO\0"
    const STRING_DATA: [u8; 4] = [0x46u8, 0x4Fu8, 0x4Fu8, 0x0u8];

    #[test]
    fn write_string() {
        // Supposed to include the nul terminator
        assert_eq!(
            crate::common_file_operations::write_string("FOO").unwrap(),
            STRING_DATA.to_vec()
        );
    }

    #[test]
    fn write_string_utf8() {
        assert_eq!(
            crate::common_file_operations::write_string("Ä").unwrap(),
            vec![0xC3, 0x84, 0x00]
        );
    }

    #[test]
    fn write_string_interior_nul() {
        assert!(crate::common_file_operations::write_string("FO\0O").is_err());
    }

    #[test]
    fn float_list() {
        assert_eq!(write_float_list(&[1.0, 0.5, 0.0, 1.0]), "1 0.5 0 1");
    }
}
