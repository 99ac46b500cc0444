use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::model::{Owner, RemoteId};

static RE_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(album|photo)(-?\d+)_(\d+)$").unwrap());
static RE_OWNER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(id|club|public|event)(\d+)$").unwrap());

/// Parsed information from a VK URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VkUrlInfo {
    Album(RemoteId),
    Photo(RemoteId),
    Owner(Owner),
}

/// Parse a VK URL into the object it points at.
///
/// Supported URL patterns:
/// - `https://vk.com/album-16297716_154228728`
/// - `https://vk.com/photo-16297716_280118215`
/// - `https://vk.com/club16297716` (also `public`, `event`)
/// - `https://vk.com/id6492`
/// - `https://vk.com/club16297716?z=photo-16297716_280118215%2Falbum-16297716_154228728`
///   (photo viewer overlay; the photo wins)
pub fn parse_vk_url(input: &str) -> Result<VkUrlInfo> {
    let url = url::Url::parse(input).map_err(|e| Error::UrlParse(e.to_string()))?;

    let host = url.host_str().unwrap_or("");
    let known = ["vk.com", "vkontakte.ru"]
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{d}")));
    if !known {
        return Err(Error::UrlParse(format!("not a VK URL: {input}")));
    }

    if let Some((_, overlay)) = url.query_pairs().find(|(k, _)| k == "z") {
        if let Some(first) = overlay.split('/').next() {
            if let Some(info) = parse_segment(first) {
                return Ok(info);
            }
        }
    }

    let segment = url
        .path_segments()
        .and_then(|mut s| s.next())
        .unwrap_or("");
    parse_segment(segment)
        .ok_or_else(|| Error::UrlParse(format!("could not parse VK URL: {input}")))
}

fn parse_segment(segment: &str) -> Option<VkUrlInfo> {
    if let Some(caps) = RE_OBJECT.captures(segment) {
        let owner_id: i64 = caps[2].parse().ok()?;
        let local_id: u64 = caps[3].parse().ok()?;
        if owner_id == 0 {
            return None;
        }
        let id = RemoteId::new(owner_id, local_id);
        return Some(match &caps[1] {
            "album" => VkUrlInfo::Album(id),
            _ => VkUrlInfo::Photo(id),
        });
    }
    if let Some(caps) = RE_OWNER.captures(segment) {
        let id: u64 = caps[2].parse().ok()?;
        let owner = match &caps[1] {
            "id" => Owner::user(id),
            _ => Owner::group(id),
        };
        return owner.ok().map(VkUrlInfo::Owner);
    }
    None
}

/// Generate the canonical VK URL for an object.
pub fn generate_vk_url(info: &VkUrlInfo) -> String {
    match info {
        VkUrlInfo::Album(id) => format!("https://vk.com/album{id}"),
        VkUrlInfo::Photo(id) => format!("https://vk.com/photo{id}"),
        VkUrlInfo::Owner(owner) => format!("https://vk.com/{owner}"),
    }
}

fn looks_like_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Accept a compound id (`-1_2`), a slug (`album-1_2`), or an album URL.
pub fn resolve_album_id(input: &str) -> Result<RemoteId> {
    match resolve_object(input)? {
        Some(VkUrlInfo::Album(id)) => Ok(id),
        Some(_) => Err(Error::InvalidIdentifier(format!("not an album: {input}"))),
        None => input.parse(),
    }
}

/// Accept a compound id (`-1_2`), a slug (`photo-1_2`), or a photo URL.
pub fn resolve_photo_id(input: &str) -> Result<RemoteId> {
    match resolve_object(input)? {
        Some(VkUrlInfo::Photo(id)) => Ok(id),
        Some(_) => Err(Error::InvalidIdentifier(format!("not a photo: {input}"))),
        None => input.parse(),
    }
}

/// Accept a signed owner id (`-16297716`), a screen name of the form
/// `club16297716` / `id6492`, or a profile/community URL.
pub fn resolve_owner(input: &str) -> Result<Owner> {
    if let Ok(signed) = input.parse::<i64>() {
        if signed == 0 {
            return Err(Error::InvalidIdentifier("owner id cannot be zero".into()));
        }
        return Ok(Owner::from_signed(signed));
    }
    match resolve_object(input)? {
        Some(VkUrlInfo::Owner(owner)) => Ok(owner),
        Some(VkUrlInfo::Album(id)) | Some(VkUrlInfo::Photo(id)) => Ok(id.owner()),
        None => Err(Error::InvalidIdentifier(format!(
            "expected an owner id, club<N>, id<N> or a VK URL, got '{input}'"
        ))),
    }
}

fn resolve_object(input: &str) -> Result<Option<VkUrlInfo>> {
    if looks_like_url(input) {
        return parse_vk_url(input).map(Some);
    }
    Ok(parse_segment(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_album_url() {
        let info = parse_vk_url("https://vk.com/album-16297716_154228728").unwrap();
        assert_eq!(info, VkUrlInfo::Album(RemoteId::new(-16297716, 154228728)));
    }

    #[test]
    fn test_photo_url_on_mobile_host() {
        let info = parse_vk_url("https://m.vk.com/photo6492_146771291").unwrap();
        assert_eq!(info, VkUrlInfo::Photo(RemoteId::new(6492, 146771291)));
    }

    #[test]
    fn test_photo_overlay_url() {
        let info = parse_vk_url(
            "https://vk.com/club16297716?z=photo-16297716_280118215%2Falbum-16297716_154228728",
        )
        .unwrap();
        assert_eq!(info, VkUrlInfo::Photo(RemoteId::new(-16297716, 280118215)));
    }

    #[test]
    fn test_owner_urls() {
        assert_eq!(
            parse_vk_url("https://vk.com/public16297716").unwrap(),
            VkUrlInfo::Owner(Owner::Group(16297716))
        );
        assert_eq!(
            parse_vk_url("https://vk.com/id6492").unwrap(),
            VkUrlInfo::Owner(Owner::User(6492))
        );
    }

    #[test]
    fn test_not_vk_url() {
        assert!(parse_vk_url("https://example.com/album-1_2").is_err());
        assert!(parse_vk_url("https://vk.com/durov").is_err());
    }

    #[test]
    fn test_generate_round_trips() {
        let album = VkUrlInfo::Album(RemoteId::new(-16297716, 154228728));
        let url = generate_vk_url(&album);
        assert_eq!(url, "https://vk.com/album-16297716_154228728");
        assert_eq!(parse_vk_url(&url).unwrap(), album);
        assert_eq!(
            generate_vk_url(&VkUrlInfo::Owner(Owner::Group(5))),
            "https://vk.com/club5"
        );
    }

    #[test]
    fn test_resolve_album_id() {
        let expected = RemoteId::new(-16297716, 154228728);
        assert_eq!(resolve_album_id("-16297716_154228728").unwrap(), expected);
        assert_eq!(resolve_album_id("album-16297716_154228728").unwrap(), expected);
        assert_eq!(
            resolve_album_id("https://vk.com/album-16297716_154228728").unwrap(),
            expected
        );
        assert!(resolve_album_id("https://vk.com/photo-16297716_1").is_err());
        assert!(resolve_album_id("nonsense").is_err());
    }

    #[test]
    fn test_resolve_photo_id() {
        assert_eq!(
            resolve_photo_id("photo6492_146771291").unwrap(),
            RemoteId::new(6492, 146771291)
        );
        assert!(resolve_photo_id("album6492_1").is_err());
    }

    #[test]
    fn test_resolve_owner() {
        assert_eq!(resolve_owner("-16297716").unwrap(), Owner::Group(16297716));
        assert_eq!(resolve_owner("6492").unwrap(), Owner::User(6492));
        assert_eq!(resolve_owner("club16297716").unwrap(), Owner::Group(16297716));
        assert_eq!(
            resolve_owner("https://vk.com/album-16297716_154228728").unwrap(),
            Owner::Group(16297716)
        );
        assert!(resolve_owner("0").is_err());
        assert!(resolve_owner("durov").is_err());
    }

    #[test]
    fn test_owner_ids_out_of_range() {
        for input in [
            "club0",
            "id0",
            "club9223372036854775808",
            "club18446744073709551615",
            "id9223372036854775808",
            "https://vk.com/club18446744073709551615",
        ] {
            assert!(resolve_owner(input).is_err(), "{input} should be rejected");
        }
        assert_eq!(
            resolve_owner("club9223372036854775807").unwrap().signed(),
            -i64::MAX
        );
        assert_eq!(
            resolve_owner("id9223372036854775807").unwrap().signed(),
            i64::MAX
        );
    }
}
