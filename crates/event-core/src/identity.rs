//! Cross-frame player identity correlation.
//!
//! OCR reads the same player name many times over an event, with different
//! errors each time and under tracker IDs that may change mid-event. The
//! correlator matches those readings against one side of the roster and
//! merges them into one identity per player.

use inkframe_battle_model::{FrameIndex, Player, Roster, Side};

use crate::consensus::{likely_text, likely_value};
use crate::similarity::{normalized_ratio, ratio};

/// One OCR reading of a player name.
#[derive(Debug, Clone, PartialEq)]
pub struct NameSample {
    pub track_id: Option<u32>,
    pub text: String,
    pub frame: FrameIndex,
}

impl NameSample {
    pub fn new(text: impl Into<String>, frame: FrameIndex) -> Self {
        Self {
            track_id: None,
            text: text.into(),
            frame,
        }
    }

    pub fn with_track(mut self, track_id: u32) -> Self {
        self.track_id = Some(track_id);
        self
    }
}

/// A player resolved from a set of samples, with the frame range they cover.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIdentity {
    pub player: Player,
    pub start_frame: FrameIndex,
    pub end_frame: FrameIndex,
}

/// Consensus of one run of samples sharing a tracker ID.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMatch<'r> {
    pub track_id: Option<u32>,
    pub text: String,
    pub player: Option<&'r Player>,
    pub start_frame: FrameIndex,
    pub end_frame: FrameIndex,
}

/// Matches names against the players of one roster side.
#[derive(Debug, Clone)]
pub struct IdentityCorrelator<'r> {
    roster: &'r Roster,
    side: Side,
    likely_ratio: f64,
    sample_ratio: f64,
}

impl<'r> IdentityCorrelator<'r> {
    pub fn new(roster: &'r Roster, side: Side) -> Self {
        Self {
            roster,
            side,
            likely_ratio: 0.3,
            sample_ratio: 0.2,
        }
    }

    /// Set the acceptance ratios used by [`merge_samples`](Self::merge_samples):
    /// `likely` for the majority player, `sample` for single readings.
    pub fn with_thresholds(mut self, likely: f64, sample: f64) -> Self {
        self.likely_ratio = likely;
        self.sample_ratio = sample;
        self
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Best roster match for one name.
    ///
    /// Candidates are ranked by [`normalized_ratio`]; the first best one is
    /// accepted only if its plain ratio exceeds `threshold`.
    pub fn find_player(&self, name: &str, threshold: f64) -> Option<&'r Player> {
        let mut best: Option<(&'r Player, f64)> = None;
        for player in self.roster.players(self.side) {
            let score = normalized_ratio(name, &player.name);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((player, score));
            }
        }
        let (player, _) = best?;
        (ratio(name, &player.name) > threshold).then_some(player)
    }

    /// Majority player over individually matched names.
    pub fn likely_player<S: AsRef<str>>(&self, names: &[S], threshold: f64) -> Option<&'r Player> {
        let ord = likely_value(
            names
                .iter()
                .map(|name| self.find_player(name.as_ref(), threshold).map(|p| p.lamp_ord)),
        )?;
        self.roster.player(self.side, ord)
    }

    /// Reduce each contiguous run of equal tracker IDs to a consensus name
    /// and match it.
    pub fn resolve_groups(&self, samples: &[NameSample], threshold: f64) -> Vec<GroupMatch<'r>> {
        samples
            .chunk_by(|a, b| a.track_id == b.track_id)
            .map(|run| {
                let texts: Vec<&str> = run.iter().map(|s| s.text.as_str()).collect();
                let text = likely_text(&texts);
                let player = self.find_player(&text, threshold);
                GroupMatch {
                    track_id: run[0].track_id,
                    player,
                    text,
                    start_frame: run.iter().map(|s| s.frame).min().unwrap_or_default(),
                    end_frame: run.iter().map(|s| s.frame).max().unwrap_or_default(),
                }
            })
            .collect()
    }

    /// Merge samples that name the same player, regardless of tracker ID.
    ///
    /// Repeatedly resolves the majority player of the remaining samples and
    /// takes every sample matching it. `verify` is asked to confirm each
    /// candidate over its frame range; rejected candidates are dropped along
    /// with their samples. Every sample is claimed by at most one candidate,
    /// so each player is returned at most once and its range spans exactly
    /// the samples it claimed.
    pub fn merge_samples<F>(&self, samples: &[NameSample], mut verify: F) -> Vec<ResolvedIdentity>
    where
        F: FnMut(&Player, FrameIndex, FrameIndex) -> bool,
    {
        let mut remaining: Vec<&NameSample> = samples.iter().collect();
        remaining.sort_by(|a, b| a.text.cmp(&b.text));

        let mut resolved: Vec<ResolvedIdentity> = Vec::new();
        while !remaining.is_empty() {
            let names: Vec<&str> = remaining.iter().map(|s| s.text.as_str()).collect();
            let Some(player) = self.likely_player(&names, self.likely_ratio) else {
                break;
            };

            let (matched, rest): (Vec<&NameSample>, Vec<&NameSample>) = remaining
                .into_iter()
                .partition(|s| self.sample_matches(s, player));
            remaining = rest;

            let (Some(start), Some(end)) = (
                matched.iter().map(|s| s.frame).min(),
                matched.iter().map(|s| s.frame).max(),
            ) else {
                break;
            };

            if !verify(player, start, end) {
                tracing::debug!(
                    player = %player.name,
                    start,
                    end,
                    "Identity candidate rejected by verification"
                );
                continue;
            }

            resolved.push(ResolvedIdentity {
                player: player.clone(),
                start_frame: start,
                end_frame: end,
            });
        }

        resolved
    }

    fn sample_matches(&self, sample: &NameSample, player: &Player) -> bool {
        self.find_player(&sample.text, self.sample_ratio)
            .is_some_and(|p| p.lamp_ord == player.lamp_ord)
    }
}
