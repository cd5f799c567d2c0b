//! 도메인 타입 -- 패키지 생태계

use std::fmt;

use serde::{Deserialize, Serialize};

/// 패키지 생태계 (언어 패키지 관리자 또는 배포판 패키지 형식)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ecosystem {
    /// Rust crates
    Cargo,
    /// JavaScript/TypeScript
    Npm,
    /// Go modules
    Go,
    /// Python
    Pip,
    /// Java (Maven)
    Maven,
    /// Ruby gems
    Gem,
    /// .NET
    Nuget,
    /// Debian/Ubuntu dpkg
    Deb,
    /// RHEL/Fedora rpm
    Rpm,
    /// Alpine apk
    Apk,
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cargo => "cargo",
            Self::Npm => "npm",
            Self::Go => "go",
            Self::Pip => "pip",
            Self::Maven => "maven",
            Self::Gem => "gem",
            Self::Nuget => "nuget",
            Self::Deb => "deb",
            Self::Rpm => "rpm",
            Self::Apk => "apk",
        };
        f.write_str(name)
    }
}

impl Ecosystem {
    /// Package URL 타입을 반환합니다.
    ///
    /// 예: Cargo -> "cargo", Go -> "golang"
    pub fn purl_type(&self) -> &'static str {
        match self {
            Self::Cargo => "cargo",
            Self::Npm => "npm",
            Self::Go => "golang",
            Self::Pip => "pypi",
            Self::Maven => "maven",
            Self::Gem => "gem",
            Self::Nuget => "nuget",
            Self::Deb => "deb",
            Self::Rpm => "rpm",
            Self::Apk => "apk",
        }
    }

    /// Package URL 타입에서 생태계를 결정합니다.
    pub fn from_purl_type(purl_type: &str) -> Option<Self> {
        match purl_type.to_lowercase().as_str() {
            "cargo" => Some(Self::Cargo),
            "npm" => Some(Self::Npm),
            "golang" => Some(Self::Go),
            "pypi" => Some(Self::Pip),
            "maven" => Some(Self::Maven),
            "gem" => Some(Self::Gem),
            "nuget" => Some(Self::Nuget),
            "deb" => Some(Self::Deb),
            "rpm" => Some(Self::Rpm),
            "apk" | "alpine" => Some(Self::Apk),
            _ => None,
        }
    }

    /// 문자열에서 생태계를 파싱합니다 (대소문자 구분 없음).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cargo" | "rust" | "crate" | "crates" => Some(Self::Cargo),
            "npm" | "node" | "javascript" | "js" => Some(Self::Npm),
            "go" | "golang" => Some(Self::Go),
            "pip" | "python" | "pypi" => Some(Self::Pip),
            "maven" | "java" => Some(Self::Maven),
            "gem" | "ruby" => Some(Self::Gem),
            "nuget" | "dotnet" => Some(Self::Nuget),
            "deb" | "dpkg" => Some(Self::Deb),
            "rpm" => Some(Self::Rpm),
            "apk" | "alpine" => Some(Self::Apk),
            _ => None,
        }
    }

    /// 배포판 패키지 형식인지 확인합니다.
    ///
    /// 배포판 패키지는 네임스페이스(`<distro>:<version>`)가 일치해야 매칭됩니다.
    pub fn is_distro(&self) -> bool {
        matches!(self, Self::Deb | Self::Rpm | Self::Apk)
    }
}
