use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{PlayerError, Result};

/// Playback technology that owns a piece of media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    #[default]
    #[serde(alias = "audio", alias = "local")]
    LocalAudio,
    #[serde(alias = "embed", alias = "mixcloud")]
    AudioEmbed,
    #[serde(alias = "youtube", alias = "video")]
    VideoEmbed,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::LocalAudio => "local_audio",
            MediaKind::AudioEmbed => "audio_embed",
            MediaKind::VideoEmbed => "video_embed",
        }
    }

    pub fn is_embed(&self) -> bool {
        !matches!(self, MediaKind::LocalAudio)
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loosely typed request handed to `load` by the host page.
///
/// Host markup builds these inline, so ids may arrive as numbers and any
/// field may be missing or null. Show records carry `type`/`audio_url`; when
/// both spellings are present the current one wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(from = "DescriptorFields")]
pub struct LoadDescriptor {
    pub id: String,
    pub title: String,
    pub series: String,
    pub date: String,
    pub kind: Option<MediaKind>,
    pub src: String,
    pub media_url: String,
    pub embed_url: String,
    pub show_url: String,
}

#[derive(Deserialize)]
struct DescriptorFields {
    #[serde(default, deserialize_with = "loose_string")]
    id: String,
    #[serde(default, deserialize_with = "loose_string")]
    title: String,
    #[serde(default, deserialize_with = "loose_string")]
    series: String,
    #[serde(default, deserialize_with = "loose_string")]
    date: String,
    #[serde(default)]
    kind: Option<MediaKind>,
    #[serde(default, rename = "type", deserialize_with = "loose_kind")]
    legacy_kind: Option<MediaKind>,
    #[serde(default, deserialize_with = "loose_string")]
    src: String,
    #[serde(default, deserialize_with = "loose_string")]
    media_url: String,
    #[serde(default, deserialize_with = "loose_string")]
    audio_url: String,
    #[serde(default, deserialize_with = "loose_string")]
    embed_url: String,
    #[serde(default, deserialize_with = "loose_string")]
    show_url: String,
}

impl From<DescriptorFields> for LoadDescriptor {
    fn from(fields: DescriptorFields) -> Self {
        Self {
            id: fields.id,
            title: fields.title,
            series: fields.series,
            date: fields.date,
            kind: fields.kind.or(fields.legacy_kind),
            src: fields.src,
            media_url: prefer(fields.media_url, fields.audio_url),
            embed_url: fields.embed_url,
            show_url: fields.show_url,
        }
    }
}

/// The single "now playing" record, also the persisted snapshot shape.
///
/// Snapshots written by the old page script use `type`, `audio_url`, `time`
/// and `playing`; they decode too, current names taking precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotFields")]
pub struct PlaybackState {
    pub id: String,
    pub title: String,
    pub series: String,
    pub date: String,
    pub kind: MediaKind,
    pub src: String,
    pub media_url: String,
    pub embed_url: String,
    pub show_url: String,
    pub position_seconds: f64, // seconds
    pub is_playing: bool,
}

#[derive(Deserialize)]
struct SnapshotFields {
    #[serde(default, deserialize_with = "loose_string")]
    id: String,
    #[serde(default, deserialize_with = "loose_string")]
    title: String,
    #[serde(default, deserialize_with = "loose_string")]
    series: String,
    #[serde(default, deserialize_with = "loose_string")]
    date: String,
    #[serde(default)]
    kind: Option<MediaKind>,
    #[serde(default, rename = "type", deserialize_with = "loose_kind")]
    legacy_kind: Option<MediaKind>,
    #[serde(default, deserialize_with = "loose_string")]
    src: String,
    #[serde(default, deserialize_with = "loose_string")]
    media_url: String,
    #[serde(default, deserialize_with = "loose_string")]
    audio_url: String,
    #[serde(default, deserialize_with = "loose_string")]
    embed_url: String,
    #[serde(default, deserialize_with = "loose_string")]
    show_url: String,
    #[serde(default, deserialize_with = "loose_seconds")]
    position_seconds: Option<f64>,
    #[serde(default, deserialize_with = "loose_seconds")]
    time: Option<f64>,
    #[serde(default)]
    is_playing: Option<bool>,
    #[serde(default)]
    playing: Option<bool>,
}

impl TryFrom<SnapshotFields> for PlaybackState {
    type Error = &'static str;

    fn try_from(fields: SnapshotFields) -> std::result::Result<Self, Self::Error> {
        let kind = fields
            .kind
            .or(fields.legacy_kind)
            .ok_or("missing field `kind`")?;
        Ok(Self {
            id: fields.id,
            title: fields.title,
            series: fields.series,
            date: fields.date,
            kind,
            src: fields.src,
            media_url: prefer(fields.media_url, fields.audio_url),
            embed_url: fields.embed_url,
            show_url: fields.show_url,
            position_seconds: fields.position_seconds.or(fields.time).unwrap_or(0.0),
            is_playing: fields.is_playing.or(fields.playing).unwrap_or(false),
        })
    }
}

fn prefer(current: String, legacy: String) -> String {
    if current.trim().is_empty() {
        legacy
    } else {
        current
    }
}

impl PlaybackState {
    /// Fresh state for a `load` call; playback intent starts as playing.
    pub fn from_descriptor(descriptor: LoadDescriptor) -> Self {
        Self {
            id: descriptor.id,
            title: descriptor.title,
            series: descriptor.series,
            date: descriptor.date,
            kind: descriptor.kind.unwrap_or_default(),
            src: descriptor.src,
            media_url: descriptor.media_url,
            embed_url: descriptor.embed_url,
            show_url: descriptor.show_url,
            position_seconds: 0.0,
            is_playing: true,
        }
    }

    /// Locator the backend for `kind` needs. Local audio prefers `media_url`.
    pub fn locator(&self) -> Option<&str> {
        let candidate = match self.kind {
            MediaKind::LocalAudio => {
                if self.media_url.trim().is_empty() {
                    self.src.as_str()
                } else {
                    self.media_url.as_str()
                }
            }
            MediaKind::AudioEmbed | MediaKind::VideoEmbed => self.embed_url.as_str(),
        };
        let candidate = candidate.trim();
        (!candidate.is_empty()).then_some(candidate)
    }

    pub fn validate(self) -> Result<Self> {
        if self.locator().is_none() {
            return Err(PlayerError::MissingLocator(self.kind));
        }
        Ok(self)
    }

    /// Decode a persisted snapshot. Restored state never claims to be playing.
    pub fn from_snapshot(raw: &str) -> Result<Self> {
        let state: PlaybackState = serde_json::from_str(raw)?;
        state.into_restored()
    }

    /// Same checks for a snapshot some store already decoded.
    pub fn into_restored(mut self) -> Result<Self> {
        self.is_playing = false;
        self.position_seconds = sanitize_seconds(self.position_seconds);
        self.validate()
    }

    pub fn to_snapshot(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// "series // date" line under the title.
    pub fn meta_line(&self) -> String {
        format!("{} // {}", self.series, self.date)
    }
}

/// One record of the static search index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ShowRecord {
    #[serde(deserialize_with = "loose_string")]
    pub id: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub title: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub description: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub series: String,
    #[serde(default)]
    pub guest: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ShowRecord {
    /// Lower-cased text a query is matched against.
    pub fn haystack(&self) -> String {
        [
            self.title.as_str(),
            self.description.as_str(),
            self.series.as_str(),
            self.guest.as_deref().unwrap_or(""),
            self.tags.join(" ").as_str(),
        ]
        .join(" ")
        .to_lowercase()
    }
}

pub fn sanitize_seconds(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

/// Clock label used by the time display, `0:00` for unknown values.
pub fn format_duration(seconds: f64) -> String {
    let seconds = sanitize_seconds(seconds);
    let total = seconds.floor() as u64;
    let mins = total / 60;
    let secs = total % 60;
    format!("{}:{:02}", mins, secs)
}

pub fn format_progress(position: f64, duration: Option<f64>) -> String {
    format!(
        "{} / {}",
        format_duration(position),
        format_duration(duration.unwrap_or(0.0))
    )
}

fn loose_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

fn loose_seconds<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

// Legacy `type` values outside the known kinds are treated as absent.
fn loose_kind<'de, D>(deserializer: D) -> std::result::Result<Option<MediaKind>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .and_then(|value| MediaKind::deserialize(value).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_defaults_missing_fields() {
        let descriptor: LoadDescriptor =
            serde_json::from_str(r#"{"id": 17, "title": "Night Shift", "src": "a.mp3"}"#)
                .unwrap();
        let state = PlaybackState::from_descriptor(descriptor);
        assert_eq!(state.id, "17");
        assert_eq!(state.kind, MediaKind::LocalAudio);
        assert_eq!(state.series, "");
        assert!(state.is_playing);
        assert_eq!(state.locator(), Some("a.mp3"));
    }

    #[test]
    fn local_audio_prefers_media_url() {
        let state = PlaybackState::from_descriptor(LoadDescriptor {
            src: "fallback.mp3".into(),
            media_url: "https://cdn.example/ep1.mp3".into(),
            ..Default::default()
        });
        assert_eq!(state.locator(), Some("https://cdn.example/ep1.mp3"));
    }

    #[test]
    fn show_types_map_to_kinds() {
        let descriptor: LoadDescriptor =
            serde_json::from_str(r#"{"type": "youtube", "embed_url": "https://yt/embed/x"}"#)
                .unwrap();
        assert_eq!(descriptor.kind, Some(MediaKind::VideoEmbed));
        let descriptor: LoadDescriptor =
            serde_json::from_str(r#"{"kind": "embed", "embed_url": "https://mc"}"#).unwrap();
        assert_eq!(descriptor.kind, Some(MediaKind::AudioEmbed));
    }

    #[test]
    fn snapshot_restores_paused() {
        let mut state = PlaybackState::from_descriptor(LoadDescriptor {
            id: "ep1".into(),
            src: "ep1.mp3".into(),
            ..Default::default()
        });
        state.position_seconds = 42.0;
        let raw = state.to_snapshot().unwrap();

        let restored = PlaybackState::from_snapshot(&raw).unwrap();
        assert!(!restored.is_playing);
        assert_eq!(restored.position_seconds, 42.0);
        assert_eq!(restored.id, "ep1");
    }

    #[test]
    fn legacy_snapshot_is_accepted() {
        let raw = r#"{"id":"ep2","title":"Old","type":"local_audio","src":"","audio_url":"ep2.mp3","time":12.5,"playing":true}"#;
        let restored = PlaybackState::from_snapshot(raw).unwrap();
        assert_eq!(restored.media_url, "ep2.mp3");
        assert_eq!(restored.position_seconds, 12.5);
        assert!(!restored.is_playing);
    }

    #[test]
    fn descriptor_with_both_spellings_prefers_current_names() {
        let descriptor: LoadDescriptor = serde_json::from_str(
            r#"{"id":"ep3","type":"mixcloud","kind":"video_embed","audio_url":"old.mp3","media_url":"new.mp3"}"#,
        )
        .unwrap();
        assert_eq!(descriptor.kind, Some(MediaKind::VideoEmbed));
        assert_eq!(descriptor.media_url, "new.mp3");

        let descriptor: LoadDescriptor =
            serde_json::from_str(r#"{"type":"mixcloud","audio_url":"old.mp3","media_url":""}"#)
                .unwrap();
        assert_eq!(descriptor.kind, Some(MediaKind::AudioEmbed));
        assert_eq!(descriptor.media_url, "old.mp3");
    }

    #[test]
    fn show_record_type_outside_known_kinds_is_ignored() {
        let descriptor: LoadDescriptor =
            serde_json::from_str(r#"{"type":"podcast","kind":"local_audio","src":"a.mp3"}"#)
                .unwrap();
        assert_eq!(descriptor.kind, Some(MediaKind::LocalAudio));
    }

    #[test]
    fn snapshot_with_both_spellings_prefers_current_names() {
        let raw = r#"{"type":"local_audio","kind":"audio_embed","embed_url":"https://mc","audio_url":"a.mp3","media_url":"b.mp3","time":5,"position_seconds":42,"playing":false,"is_playing":true}"#;
        let state: PlaybackState = serde_json::from_str(raw).unwrap();
        assert_eq!(state.kind, MediaKind::AudioEmbed);
        assert_eq!(state.media_url, "b.mp3");
        assert_eq!(state.position_seconds, 42.0);
        assert!(state.is_playing);
    }

    #[test]
    fn snapshot_without_any_kind_is_rejected() {
        let raw = r#"{"type":"cassette","src":"a.mp3"}"#;
        assert!(matches!(
            PlaybackState::from_snapshot(raw),
            Err(PlayerError::Decode(_))
        ));
    }

    #[test]
    fn snapshot_without_locator_is_rejected() {
        let raw = r#"{"kind":"video_embed","id":"x","embed_url":""}"#;
        assert!(matches!(
            PlaybackState::from_snapshot(raw),
            Err(PlayerError::MissingLocator(MediaKind::VideoEmbed))
        ));
    }

    #[test]
    fn snapshot_with_unknown_kind_is_rejected() {
        let raw = r#"{"kind":"cassette","src":"a.mp3"}"#;
        assert!(matches!(
            PlaybackState::from_snapshot(raw),
            Err(PlayerError::Decode(_))
        ));
        assert!(PlaybackState::from_snapshot("not json").is_err());
        assert!(PlaybackState::from_snapshot("null").is_err());
    }

    #[test]
    fn null_position_restores_from_start() {
        let raw = r#"{"kind":"local_audio","src":"a.mp3","position_seconds":null}"#;
        let restored = PlaybackState::from_snapshot(raw).unwrap();
        assert_eq!(restored.position_seconds, 0.0);
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(f64::NAN), "0:00");
        assert_eq!(format_duration(65.9), "1:05");
        assert_eq!(format_duration(3600.0), "60:00");
        assert_eq!(format_progress(42.0, None), "0:42 / 0:00");
        assert_eq!(format_progress(42.0, Some(125.0)), "0:42 / 2:05");
    }

    #[test]
    fn haystack_joins_all_searchable_fields() {
        let record = ShowRecord {
            id: "a".into(),
            title: "Deep Cuts".into(),
            description: "Late night".into(),
            series: "KLOOM".into(),
            guest: None,
            tags: vec!["Dub".into(), "Techno".into()],
        };
        assert_eq!(record.haystack(), "deep cuts late night kloom  dub techno");
    }
}
