//! SBOM 디코딩 -- 원본 바이트에서 패키지 목록과 스캔 컨텍스트 추출
//!
//! [`AutoDecoder`]는 문서 형식을 감지하여 CycloneDX 또는 SPDX 디코더로 위임하고,
//! 크기와 패키지 수 제한, 빈 결과 거부를 공통으로 적용합니다.
//!
//! # 형식 감지
//!
//! - `bomFormat == "CycloneDX"` -> CycloneDX JSON
//! - `spdxVersion` 필드 존재 -> SPDX 2.x JSON
//! - 그 외 -> `DecodeFailed("unknown SBOM format")`

pub mod cyclonedx;
pub mod purl;
pub mod spdx;

use serde_json::Value;

use crate::config::ScannerConfig;
use crate::error::ScannerError;
use crate::types::{Distro, Package, SbomFormat, ScanContext};

pub use cyclonedx::CycloneDxDecoder;
pub use purl::Purl;
pub use spdx::SpdxDecoder;

/// 디코딩 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSbom {
    /// 패키지 목록
    pub packages: Vec<Package>,
    /// 스캔 컨텍스트
    pub context: ScanContext,
}

/// SBOM 디코더
pub trait SbomDecoder: Send + Sync {
    /// 디코더 이름
    fn name(&self) -> &str;

    /// 원본 바이트를 디코딩합니다.
    fn decode(&self, raw: &[u8]) -> Result<DecodedSbom, ScannerError>;
}

/// JSON 문서의 SBOM 형식을 감지합니다.
pub fn detect_format(doc: &Value) -> Option<SbomFormat> {
    if doc.get("bomFormat").and_then(Value::as_str) == Some("CycloneDX") {
        return Some(SbomFormat::CycloneDx);
    }
    if doc.get("spdxVersion").is_some() {
        return Some(SbomFormat::Spdx);
    }
    None
}

/// 형식 자동 감지 디코더
#[derive(Debug, Clone)]
pub struct AutoDecoder {
    max_sbom_size: usize,
    max_packages: usize,
}

impl AutoDecoder {
    /// 제한값으로 디코더를 만듭니다.
    pub fn new(max_sbom_size: usize, max_packages: usize) -> Self {
        Self {
            max_sbom_size,
            max_packages,
        }
    }

    /// 스캐너 설정에서 디코더를 만듭니다.
    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(config.max_sbom_size, config.max_packages)
    }
}

impl Default for AutoDecoder {
    fn default() -> Self {
        Self::from_config(&ScannerConfig::default())
    }
}

impl SbomDecoder for AutoDecoder {
    fn name(&self) -> &str {
        "auto"
    }

    fn decode(&self, raw: &[u8]) -> Result<DecodedSbom, ScannerError> {
        if raw.len() > self.max_sbom_size {
            return Err(ScannerError::DecodeFailed(format!(
                "sbom too large: {} bytes (max: {})",
                raw.len(),
                self.max_sbom_size
            )));
        }

        let doc: Value = serde_json::from_slice(raw)
            .map_err(|e| ScannerError::DecodeFailed(format!("invalid json: {e}")))?;

        let decoded = match detect_format(&doc) {
            Some(SbomFormat::CycloneDx) => cyclonedx::decode_value(doc)?,
            Some(SbomFormat::Spdx) => spdx::decode_value(doc)?,
            None => {
                return Err(ScannerError::DecodeFailed(
                    "unknown SBOM format".to_owned(),
                ));
            }
        };

        if decoded.packages.is_empty() {
            return Err(ScannerError::DecodeFailed(
                "sbom contains no packages".to_owned(),
            ));
        }

        if decoded.packages.len() > self.max_packages {
            return Err(ScannerError::DecodeFailed(format!(
                "too many packages: {} (max: {})",
                decoded.packages.len(),
                self.max_packages
            )));
        }

        tracing::debug!(
            source = %decoded.context.source_name,
            format = %decoded.context.format,
            packages = decoded.packages.len(),
            distro = ?decoded.context.distro,
            "decoded sbom"
        );

        Ok(decoded)
    }
}

/// 문서 자체에 배포판 정보가 없을 때 purl `distro` 한정자에서 찾습니다.
fn distro_from_purls<'a>(purls: impl IntoIterator<Item = &'a str>) -> Option<Distro> {
    purls
        .into_iter()
        .filter_map(Purl::parse)
        .find_map(|purl| purl.distro())
}

/// 이름, 버전, purl 문자열로 패키지를 만듭니다.
///
/// 이름이나 버전이 없으면 purl 값으로 채웁니다. 그래도 이름이 없으면 `None`입니다.
fn package_from_parts(
    name: Option<&str>,
    version: Option<&str>,
    purl: Option<&str>,
) -> Option<Package> {
    let parsed = purl.and_then(Purl::parse);

    // purl이 있으면 생태계 규칙에 맞는 이름(maven group:artifact 등)을 우선합니다.
    let name = parsed
        .as_ref()
        .map(Purl::package_name)
        .or_else(|| name.map(str::to_owned))
        .filter(|n| !n.trim().is_empty())?;

    let version = version
        .map(str::to_owned)
        .filter(|v| !v.trim().is_empty())
        .or_else(|| parsed.as_ref().and_then(|p| p.version.clone()))
        .unwrap_or_default();

    Some(Package {
        name,
        version,
        ecosystem: parsed.as_ref().and_then(Purl::ecosystem),
        purl: purl.map(str::to_owned),
    })
}
