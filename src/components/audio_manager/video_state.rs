use super::BackendEvent;

const ENDED: i32 = 0;
const PLAYING: i32 = 1;
const PAUSED: i32 = 2;
const CUED: i32 = 5;

/// Maps the video player's numeric state code onto a controller event.
/// Buffering, cued and unstarted carry no transport change.
pub fn video_state_event(code: i32) -> Option<BackendEvent> {
    match code {
        ENDED => Some(BackendEvent::Ended),
        PLAYING => Some(BackendEvent::Playing),
        PAUSED => Some(BackendEvent::Paused),
        _ => None,
    }
}

/// A cued player reports 0 until playback starts, whatever its start offset.
pub fn is_cued(code: i32) -> bool {
    code == CUED
}

/// How a seek parked before the player was ready gets delivered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParkedSeek {
    /// Re-cue at the offset. Seeking a cued player would start it.
    Cue(f64),
    Seek(f64),
}

pub fn parked_seek(offset: Option<f64>, will_play: bool) -> Option<ParkedSeek> {
    let offset = offset?;
    Some(if will_play {
        ParkedSeek::Seek(offset)
    } else {
        ParkedSeek::Cue(offset)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_states() {
        assert_eq!(video_state_event(0), Some(BackendEvent::Ended));
        assert_eq!(video_state_event(1), Some(BackendEvent::Playing));
        assert_eq!(video_state_event(2), Some(BackendEvent::Paused));
    }

    #[test]
    fn transient_states_are_ignored() {
        for code in [-1, 3, 5] {
            assert_eq!(video_state_event(code), None);
        }
        assert!(is_cued(5));
        assert!(!is_cued(2));
    }

    #[test]
    fn parked_offset_is_cued_unless_playback_was_requested() {
        assert_eq!(parked_seek(Some(42.0), false), Some(ParkedSeek::Cue(42.0)));
        assert_eq!(parked_seek(Some(42.0), true), Some(ParkedSeek::Seek(42.0)));
        assert_eq!(parked_seek(None, false), None);
    }
}
