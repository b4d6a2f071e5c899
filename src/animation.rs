use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AnimationClip {
    pub name: &'static str,
    #[serde(rename = "frameCount")]
    pub frame_count: u32,
    #[serde(rename = "frameDurationMs")]
    pub frame_duration_ms: u64,
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Clip to switch to when a non-looping clip finishes.
    #[serde(skip)]
    pub then: Option<&'static str>,
}

impl AnimationClip {
    pub const fn looping(name: &'static str, frame_count: u32, frame_duration_ms: u64) -> Self {
        Self {
            name,
            frame_count,
            frame_duration_ms,
            looping: true,
            then: None,
        }
    }

    pub const fn once(
        name: &'static str,
        frame_count: u32,
        frame_duration_ms: u64,
        then: &'static str,
    ) -> Self {
        Self {
            name,
            frame_count,
            frame_duration_ms,
            looping: false,
            then: Some(then),
        }
    }
}

/// Frame counter over a fixed clip table. The first clip autoplays.
#[derive(Clone, Debug, Serialize)]
pub struct AnimationController {
    #[serde(skip)]
    clips: &'static [AnimationClip],
    current: Option<&'static str>,
    frame: u32,
    playing: bool,
    finished: bool,
    #[serde(skip)]
    last_frame_ms: u64,
}

impl AnimationController {
    pub fn new(clips: &'static [AnimationClip], now_ms: u64) -> Self {
        Self {
            clips,
            current: clips.first().map(|clip| clip.name),
            frame: 0,
            playing: !clips.is_empty(),
            finished: false,
            last_frame_ms: now_ms,
        }
    }

    fn clip(&self, name: &str) -> Option<&'static AnimationClip> {
        self.clips.iter().find(|clip| clip.name == name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.clip(name).is_some()
    }

    /// Switches to `name`. Returns false if the table has no such clip.
    /// Re-playing the running clip without `reset` leaves it untouched.
    pub fn play(&mut self, name: &str, reset: bool, now_ms: u64) -> bool {
        let Some(clip) = self.clip(name) else {
            return false;
        };
        if self.current == Some(clip.name) && !reset {
            return true;
        }
        self.current = Some(clip.name);
        self.frame = 0;
        self.finished = false;
        self.playing = true;
        self.last_frame_ms = now_ms;
        true
    }

    pub fn update(&mut self, now_ms: u64) {
        let Some(clip) = self.current.and_then(|name| self.clip(name)) else {
            return;
        };
        if !self.playing || self.finished || clip.frame_duration_ms == 0 {
            return;
        }
        let elapsed = now_ms.saturating_sub(self.last_frame_ms);
        if elapsed < clip.frame_duration_ms {
            return;
        }
        self.frame += (elapsed / clip.frame_duration_ms) as u32;
        self.last_frame_ms = now_ms - elapsed % clip.frame_duration_ms;
        if self.frame < clip.frame_count {
            return;
        }
        if clip.looping {
            self.frame %= clip.frame_count.max(1);
            return;
        }
        self.frame = clip.frame_count.saturating_sub(1);
        self.playing = false;
        self.finished = true;
        if let Some(next) = clip.then {
            self.play(next, true, now_ms);
        }
    }

    pub fn current(&self) -> Option<&'static str> {
        self.current
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
