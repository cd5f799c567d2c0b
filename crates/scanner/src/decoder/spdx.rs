//! SPDX 2.x JSON SBOM 디코딩
//!
//! `packages[]`를 패키지로 변환합니다. purl은 `externalRefs` 중
//! `referenceType == "purl"`인 항목에서 가져옵니다.

use serde::Deserialize;
use serde_json::Value;

use super::{DecodedSbom, SbomDecoder, distro_from_purls, package_from_parts};
use crate::error::ScannerError;
use crate::types::{SbomFormat, ScanContext};

/// SPDX 문서 루트 구조
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxDocument {
    #[serde(default)]
    name: String,
    #[serde(default)]
    packages: Vec<SpdxPackage>,
}

/// SPDX 패키지
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxPackage {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version_info: Option<String>,
    #[serde(default)]
    external_refs: Vec<SpdxExternalRef>,
}

/// SPDX 외부 참조
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxExternalRef {
    #[serde(default)]
    reference_type: String,
    #[serde(default)]
    reference_locator: String,
}

impl SpdxPackage {
    fn purl(&self) -> Option<&str> {
        self.external_refs
            .iter()
            .find(|r| r.reference_type == "purl" && !r.reference_locator.is_empty())
            .map(|r| r.reference_locator.as_str())
    }
}

/// SPDX 전용 디코더
#[derive(Debug, Clone, Copy, Default)]
pub struct SpdxDecoder;

impl SbomDecoder for SpdxDecoder {
    fn name(&self) -> &str {
        "spdx-json"
    }

    fn decode(&self, raw: &[u8]) -> Result<DecodedSbom, ScannerError> {
        let doc: Value = serde_json::from_slice(raw)
            .map_err(|e| ScannerError::DecodeFailed(format!("invalid json: {e}")))?;
        decode_value(doc)
    }
}

/// 파싱된 JSON 값을 SPDX 문서로 해석합니다.
pub fn decode_value(doc: Value) -> Result<DecodedSbom, ScannerError> {
    let doc: SpdxDocument = serde_json::from_value(doc)
        .map_err(|e| ScannerError::DecodeFailed(format!("invalid spdx document: {e}")))?;

    let packages = doc
        .packages
        .iter()
        .filter_map(|p| package_from_parts(p.name.as_deref(), p.version_info.as_deref(), p.purl()))
        .collect();

    let distro = distro_from_purls(doc.packages.iter().filter_map(SpdxPackage::purl));

    Ok(DecodedSbom {
        packages,
        context: ScanContext {
            source_name: doc.name,
            format: SbomFormat::Spdx,
            distro,
        },
    })
}

#[cfg(test)]
mod tests {
    use scanward_vuln_db::Ecosystem;

    use super::*;

    const SPDX: &str = r#"{
        "spdxVersion": "SPDX-2.3",
        "name": "web-frontend",
        "packages": [
            {
                "name": "lodash",
                "versionInfo": "4.17.20",
                "externalRefs": [
                    {"referenceCategory": "SECURITY", "referenceType": "cpe23Type", "referenceLocator": "cpe:2.3:a:lodash:lodash:4.17.20"},
                    {"referenceCategory": "PACKAGE-MANAGER", "referenceType": "purl", "referenceLocator": "pkg:npm/lodash@4.17.20"}
                ]
            },
            {"name": "internal-tool", "versionInfo": "0.1.0"}
        ]
    }"#;

    #[test]
    fn decodes_packages_and_document_name() {
        let decoded = SpdxDecoder.decode(SPDX.as_bytes()).unwrap();
        assert_eq!(decoded.context.source_name, "web-frontend");
        assert_eq!(decoded.context.format, SbomFormat::Spdx);
        assert_eq!(decoded.packages.len(), 2);

        let lodash = &decoded.packages[0];
        assert_eq!(lodash.ecosystem, Some(Ecosystem::Npm));
        assert_eq!(lodash.purl.as_deref(), Some("pkg:npm/lodash@4.17.20"));

        let internal = &decoded.packages[1];
        assert_eq!(internal.ecosystem, None);
        assert!(internal.purl.is_none());
    }

    #[test]
    fn distro_taken_from_purl_qualifier() {
        let doc = r#"{
            "spdxVersion": "SPDX-2.3",
            "name": "image",
            "packages": [{
                "name": "openssl",
                "versionInfo": "3.0.11-1~deb12u2",
                "externalRefs": [{"referenceType": "purl",
                    "referenceLocator": "pkg:deb/debian/openssl@3.0.11-1~deb12u2?distro=debian-12"}]
            }]
        }"#;
        let decoded = SpdxDecoder.decode(doc.as_bytes()).unwrap();
        assert_eq!(decoded.context.distro.unwrap().namespace(), "debian:12");
        assert_eq!(decoded.packages[0].ecosystem, Some(Ecosystem::Deb));
    }

    #[test]
    fn missing_packages_yields_empty_list() {
        let decoded = SpdxDecoder
            .decode(br#"{"spdxVersion": "SPDX-2.3", "name": "empty"}"#)
            .unwrap();
        assert!(decoded.packages.is_empty());
    }

    #[test]
    fn wrong_shape_is_decode_failure() {
        let err = SpdxDecoder
            .decode(br#"{"spdxVersion": "SPDX-2.3", "packages": {}}"#)
            .unwrap_err();
        assert!(matches!(err, ScannerError::DecodeFailed(_)));
    }
}
