//! An in-memory player.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reelsync_engine::{Player, PlayerError};

/// A [`Player`] with no decoder behind it. Playback advances only when the
/// host calls [`advance`](SimulatedPlayer::advance).
#[derive(Debug, Clone)]
pub struct SimulatedPlayer {
    position: f64,
    length: Duration,
    playing: bool,
    media: Option<PathBuf>,
}

impl SimulatedPlayer {
    pub fn new(length: Duration) -> Self {
        Self {
            position: 0.0,
            length,
            playing: false,
            media: None,
        }
    }

    /// Currently loaded media, if any.
    pub fn media(&self) -> Option<&Path> {
        self.media.as_deref()
    }

    /// Let `elapsed` of wall time pass. Returns whether the position moved.
    ///
    /// Playback stops at the end of the media.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        if !self.playing || self.length.is_zero() {
            return false;
        }
        let step = elapsed.as_secs_f64() / self.length.as_secs_f64();
        self.position = (self.position + step).min(1.0);
        if self.position >= 1.0 {
            self.playing = false;
        }
        step > 0.0
    }
}

impl Player for SimulatedPlayer {
    fn position(&self) -> f64 {
        self.position
    }

    fn set_position(&mut self, fraction: f64) {
        self.position = fraction.clamp(0.0, 1.0);
    }

    fn length(&self) -> Duration {
        self.length
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn stop(&mut self) {
        self.playing = false;
        self.position = 0.0;
    }

    fn load_media(&mut self, path: &Path) -> Result<(), PlayerError> {
        if !path.exists() {
            return Err(PlayerError::MediaNotFound(path.to_path_buf()));
        }
        if !path.is_file() {
            return Err(PlayerError::LoadFailed(format!(
                "{} is not a media file",
                path.display()
            )));
        }
        self.media = Some(path.to_path_buf());
        self.position = 0.0;
        self.playing = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_only_while_playing() {
        let mut player = SimulatedPlayer::new(Duration::from_secs(100));
        assert!(!player.advance(Duration::from_secs(10)));

        player.play();
        assert!(player.advance(Duration::from_secs(10)));
        assert!((player.position() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn playback_stops_at_the_end() {
        let mut player = SimulatedPlayer::new(Duration::from_secs(100));
        player.set_position(0.95);
        player.play();
        player.advance(Duration::from_secs(30));

        assert_eq!(player.position(), 1.0);
        assert!(!player.is_playing());
    }

    #[test]
    fn stop_rewinds() {
        let mut player = SimulatedPlayer::new(Duration::from_secs(100));
        player.set_position(0.5);
        player.play();
        player.stop();
        assert_eq!(player.position(), 0.0);
        assert!(!player.is_playing());
    }

    #[test]
    fn load_missing_media_fails() {
        let mut player = SimulatedPlayer::new(Duration::from_secs(100));
        let result = player.load_media(Path::new("/definitely/not/here.mkv"));
        assert!(matches!(result, Err(PlayerError::MediaNotFound(_))));
        assert!(player.media().is_none());
    }

    #[test]
    fn load_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut player = SimulatedPlayer::new(Duration::from_secs(100));
        let result = player.load_media(dir.path());
        assert!(matches!(result, Err(PlayerError::LoadFailed(_))));
        assert!(player.media().is_none());
    }

    #[test]
    fn load_file_rewinds() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut player = SimulatedPlayer::new(Duration::from_secs(100));
        player.set_position(0.4);
        player.play();

        player.load_media(file.path()).unwrap();
        assert_eq!(player.media(), Some(file.path()));
        assert_eq!(player.position(), 0.0);
        assert!(!player.is_playing());
    }
}
