//! Package URL 파싱
//!
//! `pkg:<type>/<namespace>/<name>@<version>?<qualifiers>#<subpath>` 형식을 분해합니다.
//! 각 구성 요소의 퍼센트 인코딩을 해제합니다.

use scanward_vuln_db::Ecosystem;

use crate::types::Distro;

/// 파싱된 Package URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purl {
    /// 패키지 타입 (소문자)
    pub purl_type: String,
    /// 네임스페이스 (npm scope, maven group, 배포판 vendor 등)
    pub namespace: Option<String>,
    /// 패키지 이름
    pub name: String,
    /// 버전
    pub version: Option<String>,
    /// 한정자 (`key=value`)
    pub qualifiers: Vec<(String, String)>,
}

impl Purl {
    /// 문자열을 파싱합니다. 형식이 맞지 않으면 `None`입니다.
    pub fn parse(input: &str) -> Option<Self> {
        let rest = input.trim().strip_prefix("pkg:")?;
        let rest = rest.trim_start_matches('/');

        // subpath는 매칭에 쓰지 않음
        let rest = rest.split_once('#').map_or(rest, |(head, _)| head);

        let (rest, qualifiers) = match rest.split_once('?') {
            Some((head, query)) => (head, parse_qualifiers(query)),
            None => (rest, Vec::new()),
        };

        let (path, version) = match rest.rsplit_once('@') {
            Some((path, version)) if !version.is_empty() => (path, Some(percent_decode(version))),
            _ => (rest, None),
        };

        let (purl_type, remainder) = path.split_once('/')?;
        if purl_type.is_empty() {
            return None;
        }

        let remainder = remainder.trim_matches('/');
        let (namespace, name) = match remainder.rsplit_once('/') {
            Some((ns, name)) => (Some(ns), name),
            None => (None, remainder),
        };
        if name.is_empty() {
            return None;
        }

        Some(Self {
            purl_type: purl_type.to_ascii_lowercase(),
            namespace: namespace
                .filter(|ns| !ns.is_empty())
                .map(|ns| ns.split('/').map(percent_decode).collect::<Vec<_>>().join("/")),
            name: percent_decode(name),
            version,
            qualifiers,
        })
    }

    /// purl 타입에 대응하는 생태계
    pub fn ecosystem(&self) -> Option<Ecosystem> {
        Ecosystem::from_purl_type(&self.purl_type)
    }

    /// 취약점 레코드 조회에 쓰는 패키지 이름
    ///
    /// - maven: `group:artifact`
    /// - npm, golang: `namespace/name`
    /// - 그 외: `name`
    pub fn package_name(&self) -> String {
        match (self.purl_type.as_str(), &self.namespace) {
            ("maven", Some(ns)) => format!("{ns}:{}", self.name),
            ("npm" | "golang", Some(ns)) => format!("{ns}/{}", self.name),
            _ => self.name.clone(),
        }
    }

    /// 한정자 값을 조회합니다.
    pub fn qualifier(&self, key: &str) -> Option<&str> {
        self.qualifiers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `distro` 한정자(예: `debian-12`)에서 배포판 정보를 추출합니다.
    pub fn distro(&self) -> Option<Distro> {
        let raw = self.qualifier("distro")?;
        let (name, version) = raw.rsplit_once('-')?;
        if name.is_empty() || version.is_empty() {
            return None;
        }
        Some(Distro {
            name: name.to_owned(),
            version: version.to_owned(),
        })
    }
}

fn parse_qualifiers(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .map(|(k, v)| (k.to_ascii_lowercase(), percent_decode(v)))
        .collect()
}

/// `%XX` 시퀀스를 해제합니다. 잘못된 시퀀스는 그대로 둡니다.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2]))
        {
            out.push((hi << 4) | lo);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_cargo_purl() {
        let purl = Purl::parse("pkg:cargo/serde@1.0.204").unwrap();
        assert_eq!(purl.purl_type, "cargo");
        assert_eq!(purl.namespace, None);
        assert_eq!(purl.name, "serde");
        assert_eq!(purl.version.as_deref(), Some("1.0.204"));
        assert_eq!(purl.ecosystem(), Some(Ecosystem::Cargo));
    }

    #[test]
    fn parses_scoped_npm_purl() {
        let purl = Purl::parse("pkg:npm/%40angular/core@16.2.0").unwrap();
        assert_eq!(purl.namespace.as_deref(), Some("@angular"));
        assert_eq!(purl.package_name(), "@angular/core");
    }

    #[test]
    fn maven_name_joins_group_and_artifact() {
        let purl =
            Purl::parse("pkg:maven/org.apache.logging.log4j/log4j-core@2.14.1?type=jar").unwrap();
        assert_eq!(purl.package_name(), "org.apache.logging.log4j:log4j-core");
        assert_eq!(purl.qualifier("type"), Some("jar"));
    }

    #[test]
    fn golang_name_keeps_module_path() {
        let purl = Purl::parse("pkg:golang/github.com/gin-gonic/gin@v1.9.0").unwrap();
        assert_eq!(purl.package_name(), "github.com/gin-gonic/gin");
        assert_eq!(purl.ecosystem(), Some(Ecosystem::Go));
    }

    #[test]
    fn deb_purl_exposes_distro_qualifier() {
        let purl =
            Purl::parse("pkg:deb/debian/libc6@2.36-9%2Bdeb12u4?arch=amd64&distro=debian-12")
                .unwrap();
        assert_eq!(purl.package_name(), "libc6");
        assert_eq!(purl.version.as_deref(), Some("2.36-9+deb12u4"));
        assert_eq!(
            purl.distro(),
            Some(Distro {
                name: "debian".to_owned(),
                version: "12".to_owned(),
            })
        );
    }

    #[test]
    fn unknown_type_has_no_ecosystem() {
        let purl = Purl::parse("pkg:generic/openssl@3.0.0").unwrap();
        assert_eq!(purl.ecosystem(), None);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(Purl::parse("cargo/serde@1.0").is_none());
        assert!(Purl::parse("pkg:cargo").is_none());
        assert!(Purl::parse("pkg:/serde@1.0").is_none());
        assert!(Purl::parse("pkg:cargo/@1.0").is_none());
    }

    #[test]
    fn percent_decode_leaves_invalid_sequences() {
        assert_eq!(percent_decode("a%2Bb"), "a+b");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
    }
}
