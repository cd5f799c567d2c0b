//! 도메인 타입 -- 스캔 입력 데이터 구조
//!
//! 디코딩된 패키지, 배포판 정보, 스캔 컨텍스트를 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use scanward_vuln_db::Ecosystem;

/// SBOM에서 디코딩된 단일 패키지
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// 패키지 이름
    pub name: String,
    /// 패키지 버전
    pub version: String,
    /// 패키지 생태계 (purl에서 유도, 알 수 없으면 `None`)
    pub ecosystem: Option<Ecosystem>,
    /// Package URL (예: `pkg:cargo/serde@1.0.204`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
}

impl Package {
    /// 이름, 버전, 생태계로 패키지를 만들고 PURL을 채웁니다.
    pub fn new(name: impl Into<String>, version: impl Into<String>, ecosystem: Ecosystem) -> Self {
        let name = name.into();
        let version = version.into();
        let purl = Some(format!("pkg:{}/{}@{}", ecosystem.purl_type(), name, version));
        Self {
            name,
            version,
            ecosystem: Some(ecosystem),
            purl,
        }
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ecosystem {
            Some(eco) => write!(f, "{}@{} ({})", self.name, self.version, eco),
            None => write!(f, "{}@{}", self.name, self.version),
        }
    }
}

/// 배포판 정보 (OS 패키지 매칭의 네임스페이스)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distro {
    /// 배포판 이름 (예: `debian`)
    pub name: String,
    /// 배포판 버전 (예: `12`)
    pub version: String,
}

impl Distro {
    /// 레코드 네임스페이스 형식(`<name>:<version>`)을 반환합니다.
    pub fn namespace(&self) -> String {
        format!("{}:{}", self.name.to_lowercase(), self.version)
    }
}

impl fmt::Display for Distro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// SBOM 입력 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SbomFormat {
    /// CycloneDX JSON
    CycloneDx,
    /// SPDX 2.x JSON
    Spdx,
}

impl fmt::Display for SbomFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CycloneDx => write!(f, "cyclonedx-json"),
            Self::Spdx => write!(f, "spdx-json"),
        }
    }
}

/// 스캔 컨텍스트 -- 패키지 목록과 함께 매처에 전달됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanContext {
    /// 원본 이름 (SBOM 문서 이름 또는 메타데이터 컴포넌트)
    pub source_name: String,
    /// 입력 형식
    pub format: SbomFormat,
    /// 배포판 정보 (OS 컴포넌트가 있을 때)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distro: Option<Distro>,
}

impl ScanContext {
    /// 이름과 형식으로 컨텍스트를 만듭니다.
    pub fn new(source_name: impl Into<String>, format: SbomFormat) -> Self {
        Self {
            source_name: source_name.into(),
            format,
            distro: None,
        }
    }

    /// 배포판 정보를 설정합니다.
    pub fn with_distro(mut self, distro: Distro) -> Self {
        self.distro = Some(distro);
        self
    }
}
