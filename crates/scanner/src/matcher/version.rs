//! 버전 비교 -- 영향 범위 매칭
//!
//! 양쪽 모두 SemVer로 해석되면 `semver` 크레이트로 비교합니다. 앞의 `v`는 무시하고
//! `1.2` 같은 축약형은 `1.2.0`으로 채웁니다. 그 외(배포판 버전 등)는 숫자 구간은 숫자로,
//! 문자 구간은 사전순으로 비교하는 구간 비교로 fallback합니다.

use std::cmp::Ordering;

use scanward_vuln_db::VersionRange;

/// 주어진 버전이 취약점 영향 범위에 포함되는지 확인합니다.
///
/// # 매칭 규칙
///
/// - `introduced`가 None이면 시작 제한 없음
/// - `fixed`가 None이면 아직 수정되지 않음
/// - `introduced <= version < fixed`이면 영향받음
///
/// 여러 범위 중 하나라도 매칭되면 `true`입니다. 범위가 비어 있거나 버전이 비어 있으면 `false`입니다.
pub fn is_affected(version: &str, ranges: &[VersionRange]) -> bool {
    let version = version.trim();
    if version.is_empty() {
        return false;
    }
    ranges.iter().any(|range| is_in_range(version, range))
}

fn is_in_range(version: &str, range: &VersionRange) -> bool {
    if let Some(introduced) = range.introduced.as_deref()
        && compare(version, introduced) == Ordering::Less
    {
        return false;
    }

    if let Some(fixed) = range.fixed.as_deref()
        && compare(version, fixed) != Ordering::Less
    {
        return false;
    }

    true
}

/// 두 버전 문자열을 비교합니다.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse_semver(a), parse_semver(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => compare_segments(a, b),
    }
}

/// SemVer로 관대하게 해석합니다.
fn parse_semver(raw: &str) -> Option<semver::Version> {
    let raw = raw.trim();
    let raw = raw.strip_prefix('v').unwrap_or(raw);
    if let Ok(version) = semver::Version::parse(raw) {
        return Some(version);
    }

    // 축약형 (1, 1.2) 보정: pre-release/build 없이 숫자만 있는 경우
    let parts: Vec<&str> = raw.split('.').collect();
    if parts.is_empty()
        || parts.len() > 2
        || !parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }
    let padded = match parts.as_slice() {
        [major] => format!("{major}.0.0"),
        [major, minor] => format!("{major}.{minor}.0"),
        _ => return None,
    };
    semver::Version::parse(&padded).ok()
}

/// 숫자 구간과 문자 구간을 번갈아 비교합니다. `~`는 어떤 값보다도 앞섭니다.
fn compare_segments(a: &str, b: &str) -> Ordering {
    let mut a = a.trim();
    let mut b = b.trim();

    loop {
        // 구분자 건너뛰기 (`~`는 의미가 있으므로 남김)
        a = a.trim_start_matches(|c: char| !c.is_ascii_alphanumeric() && c != '~');
        b = b.trim_start_matches(|c: char| !c.is_ascii_alphanumeric() && c != '~');

        match (a.strip_prefix('~'), b.strip_prefix('~')) {
            (Some(ra), Some(rb)) => {
                a = ra;
                b = rb;
                continue;
            }
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => {}
        }

        match (a.is_empty(), b.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }

        let a_numeric = a.starts_with(|c: char| c.is_ascii_digit());
        let b_numeric = b.starts_with(|c: char| c.is_ascii_digit());
        if a_numeric != b_numeric {
            // 숫자 구간이 문자 구간보다 뒤
            return if a_numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let (seg_a, rest_a) = split_segment(a, a_numeric);
        let (seg_b, rest_b) = split_segment(b, b_numeric);

        let ord = if a_numeric {
            let seg_a = seg_a.trim_start_matches('0');
            let seg_b = seg_b.trim_start_matches('0');
            seg_a.len().cmp(&seg_b.len()).then_with(|| seg_a.cmp(seg_b))
        } else {
            seg_a.cmp(seg_b)
        };
        if ord != Ordering::Equal {
            return ord;
        }

        a = rest_a;
        b = rest_b;
    }
}

fn split_segment(s: &str, numeric: bool) -> (&str, &str) {
    let end = s
        .find(|c: char| {
            if numeric {
                !c.is_ascii_digit()
            } else {
                !c.is_ascii_alphabetic()
            }
        })
        .unwrap_or(s.len());
    s.split_at(end)
}
