/// Utility helpers for embed locators

/// Show path carried in the `feed` query parameter of an audio-embed iframe URL,
/// percent-decoded.
pub fn embed_feed_path<S: AsRef<str>>(embed_url: S) -> Option<String> {
    let url = embed_url.as_ref();
    let query = url.split_once('?')?.1;
    let query = query.split('#').next().unwrap_or(query);

    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key != "feed" || value.is_empty() {
            return None;
        }
        urlencoding::decode(&value.replace('+', " "))
            .ok()
            .map(|decoded| decoded.into_owned())
    })
}

/// Video id from a video-embed URL: the last non-empty path segment.
pub fn embed_video_id<S: AsRef<str>>(embed_url: S) -> Option<String> {
    let url = embed_url.as_ref();
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let path = path.trim_end_matches('/');
    let without_scheme = path.split_once("://").map(|(_, rest)| rest).unwrap_or(path);
    // A bare host has no video segment.
    if !without_scheme.contains('/') {
        return None;
    }
    path.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Public page for an embedded show, used when no show page is known.
pub fn listen_url(kind: crate::api::MediaKind, embed_url: &str) -> Option<String> {
    match kind {
        crate::api::MediaKind::AudioEmbed => {
            embed_feed_path(embed_url).map(|feed| format!("https://www.mixcloud.com{feed}"))
        }
        crate::api::MediaKind::VideoEmbed => {
            embed_video_id(embed_url).map(|id| format!("https://www.youtube.com/watch?v={id}"))
        }
        crate::api::MediaKind::LocalAudio => None,
    }
}
