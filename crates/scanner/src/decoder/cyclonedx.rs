//! CycloneDX JSON SBOM 디코딩
//!
//! `components[]`(중첩 포함)를 패키지로 변환합니다. `operating-system` 타입 컴포넌트는
//! 패키지가 아니라 배포판 컨텍스트로 사용합니다.

use serde::Deserialize;
use serde_json::Value;

use super::{DecodedSbom, SbomDecoder, distro_from_purls, package_from_parts};
use crate::error::ScannerError;
use crate::types::{Distro, SbomFormat, ScanContext};

/// 컴포넌트 중첩 깊이 제한
const MAX_NESTING_DEPTH: usize = 32;

/// CycloneDX BOM 루트 구조
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CycloneDxBom {
    #[serde(default)]
    metadata: Option<CycloneDxMetadata>,
    #[serde(default)]
    components: Vec<CycloneDxComponent>,
}

/// CycloneDX 메타데이터
#[derive(Deserialize)]
struct CycloneDxMetadata {
    #[serde(default)]
    component: Option<CycloneDxComponent>,
}

/// CycloneDX 컴포넌트
#[derive(Deserialize)]
struct CycloneDxComponent {
    #[serde(rename = "type", default)]
    component_type: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    purl: Option<String>,
    #[serde(default)]
    components: Vec<CycloneDxComponent>,
}

/// CycloneDX 전용 디코더 (형식 감지 없이 바로 해석)
#[derive(Debug, Clone, Copy, Default)]
pub struct CycloneDxDecoder;

impl SbomDecoder for CycloneDxDecoder {
    fn name(&self) -> &str {
        "cyclonedx-json"
    }

    fn decode(&self, raw: &[u8]) -> Result<DecodedSbom, ScannerError> {
        let doc: Value = serde_json::from_slice(raw)
            .map_err(|e| ScannerError::DecodeFailed(format!("invalid json: {e}")))?;
        decode_value(doc)
    }
}

/// 파싱된 JSON 값을 CycloneDX 문서로 해석합니다.
pub fn decode_value(doc: Value) -> Result<DecodedSbom, ScannerError> {
    let bom: CycloneDxBom = serde_json::from_value(doc)
        .map_err(|e| ScannerError::DecodeFailed(format!("invalid cyclonedx document: {e}")))?;

    let source_name = bom
        .metadata
        .as_ref()
        .and_then(|m| m.component.as_ref())
        .and_then(|c| c.name.clone())
        .unwrap_or_default();

    let mut flat = Vec::new();
    flatten(&bom.components, 0, &mut flat)?;

    let mut packages = Vec::new();
    let mut distro = None;
    for component in &flat {
        if component.component_type == "operating-system" {
            if distro.is_none() {
                distro = os_distro(component);
            }
            continue;
        }
        if let Some(pkg) = package_from_parts(
            component.name.as_deref(),
            component.version.as_deref(),
            component.purl.as_deref(),
        ) {
            packages.push(pkg);
        }
    }

    if distro.is_none() {
        distro = distro_from_purls(flat.iter().filter_map(|c| c.purl.as_deref()));
    }

    Ok(DecodedSbom {
        packages,
        context: ScanContext {
            source_name,
            format: SbomFormat::CycloneDx,
            distro,
        },
    })
}

fn flatten<'a>(
    components: &'a [CycloneDxComponent],
    depth: usize,
    out: &mut Vec<&'a CycloneDxComponent>,
) -> Result<(), ScannerError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(ScannerError::DecodeFailed(format!(
            "components nested deeper than {MAX_NESTING_DEPTH}"
        )));
    }
    for component in components {
        out.push(component);
        flatten(&component.components, depth + 1, out)?;
    }
    Ok(())
}

fn os_distro(component: &CycloneDxComponent) -> Option<Distro> {
    let name = component.name.as_deref()?.trim();
    let version = component.version.as_deref()?.trim();
    if name.is_empty() || version.is_empty() {
        return None;
    }
    Some(Distro {
        name: name.to_lowercase(),
        version: version.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use scanward_vuln_db::Ecosystem;

    use super::*;

    fn decode(json: &str) -> DecodedSbom {
        CycloneDxDecoder.decode(json.as_bytes()).unwrap()
    }

    #[test]
    fn decodes_components_with_purls() {
        let decoded = decode(
            r#"{
                "bomFormat": "CycloneDX",
                "metadata": {"component": {"type": "application", "name": "my-app"}},
                "components": [
                    {"type": "library", "name": "serde", "version": "1.0.204", "purl": "pkg:cargo/serde@1.0.204"},
                    {"type": "library", "name": "lodash", "version": "4.17.20", "purl": "pkg:npm/lodash@4.17.20"}
                ]
            }"#,
        );
        assert_eq!(decoded.context.source_name, "my-app");
        assert_eq!(decoded.context.format, SbomFormat::CycloneDx);
        assert_eq!(decoded.packages.len(), 2);
        assert_eq!(decoded.packages[0].ecosystem, Some(Ecosystem::Cargo));
        assert_eq!(decoded.packages[1].name, "lodash");
    }

    #[test]
    fn operating_system_component_becomes_distro() {
        let decoded = decode(
            r#"{
                "bomFormat": "CycloneDX",
                "components": [
                    {"type": "operating-system", "name": "Debian", "version": "12"},
                    {"type": "library", "name": "libc6", "version": "2.36-9", "purl": "pkg:deb/debian/libc6@2.36-9"}
                ]
            }"#,
        );
        assert_eq!(decoded.packages.len(), 1);
        let distro = decoded.context.distro.unwrap();
        assert_eq!(distro.namespace(), "debian:12");
    }

    #[test]
    fn distro_falls_back_to_purl_qualifier() {
        let decoded = decode(
            r#"{
                "bomFormat": "CycloneDX",
                "components": [
                    {"type": "library", "name": "libc6", "version": "2.36-9",
                     "purl": "pkg:deb/debian/libc6@2.36-9?distro=debian-12"}
                ]
            }"#,
        );
        assert_eq!(decoded.context.distro.unwrap().namespace(), "debian:12");
    }

    #[test]
    fn nested_components_are_flattened() {
        let decoded = decode(
            r#"{
                "bomFormat": "CycloneDX",
                "components": [
                    {"type": "library", "name": "outer", "version": "1.0.0",
                     "components": [{"type": "library", "name": "inner", "version": "2.0.0"}]}
                ]
            }"#,
        );
        let names: Vec<_> = decoded.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["outer", "inner"]);
        assert_eq!(decoded.packages[1].ecosystem, None);
    }

    #[test]
    fn components_without_name_are_skipped() {
        let decoded = decode(
            r#"{"bomFormat": "CycloneDX", "components": [{"type": "library", "version": "1.0"}]}"#,
        );
        assert!(decoded.packages.is_empty());
    }

    #[test]
    fn excessive_nesting_rejected() {
        let mut json = String::from(r#"{"type": "library", "name": "leaf", "version": "1"}"#);
        for _ in 0..=MAX_NESTING_DEPTH + 1 {
            json = format!(r#"{{"type": "library", "name": "n", "version": "1", "components": [{json}]}}"#);
        }
        let doc = format!(r#"{{"bomFormat": "CycloneDX", "components": [{json}]}}"#);
        let err = CycloneDxDecoder.decode(doc.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("nested"));
    }

    #[test]
    fn wrong_shape_is_decode_failure() {
        let err = CycloneDxDecoder
            .decode(br#"{"bomFormat": "CycloneDX", "components": "nope"}"#)
            .unwrap_err();
        assert!(matches!(err, ScannerError::DecodeFailed(_)));
    }
}
