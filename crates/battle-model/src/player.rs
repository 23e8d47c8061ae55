//! Players, sides, rules and the battle roster.

use serde::{Deserialize, Serialize};

/// Which side of the battle a player or lamp row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Team,
    Enemy,
    #[default]
    NoSide,
}

impl Side {
    /// The opposing side. `NoSide` has no opponent.
    pub fn opposite(&self) -> Side {
        match self {
            Side::Team => Side::Enemy,
            Side::Enemy => Side::Team,
            Side::NoSide => Side::NoSide,
        }
    }
}

/// Battle rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Turf war: count grows with painted area.
    Nawabari,
    /// Splat zones.
    Area,
    /// Tower control.
    Yagura,
    /// Rainmaker.
    Hoko,
    /// Clam blitz.
    Asari,
}

impl Rule {
    /// Countdown rules start at 100 and count toward zero.
    pub fn is_countdown(&self) -> bool {
        !matches!(self, Rule::Nawabari)
    }

    /// Count shown on the indicator when the battle opens.
    pub fn initial_count(&self) -> u32 {
        if self.is_countdown() {
            100
        } else {
            0
        }
    }
}

/// Outcome of a battle from the team's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinLose {
    Win,
    Lose,
    Draw,
}

/// Weapon set carried by a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Loadout {
    #[serde(default)]
    pub main_id: String,
    pub main_label: String,
    #[serde(default)]
    pub sub_id: String,
    pub sub_label: String,
    #[serde(default)]
    pub special_id: String,
    pub special_label: String,
}

/// One participant of the battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    #[serde(default)]
    pub id: String,

    /// In-game name as shown on plates and notifications.
    pub name: String,

    #[serde(default)]
    pub side: Side,

    /// Position of this player's lamp within its side's lamp row.
    pub lamp_ord: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loadout: Option<Loadout>,
}

impl Player {
    pub fn new(name: impl Into<String>, side: Side, lamp_ord: usize) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            side,
            lamp_ord,
            loadout: None,
        }
    }

    /// Attach a weapon set.
    pub fn with_loadout(mut self, loadout: Loadout) -> Self {
        self.loadout = Some(loadout);
        self
    }
}

/// Fixed list of players in one battle, supplied before analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Roster {
    #[serde(default)]
    pub team: Vec<Player>,

    #[serde(default)]
    pub enemy: Vec<Player>,

    /// Lamp ordinal of the recording player within the team row.
    #[serde(default)]
    pub main_player_ord: Option<usize>,
}

impl Roster {
    /// Build a roster, forcing each player's side to the list it is in.
    pub fn new(team: Vec<Player>, enemy: Vec<Player>) -> Self {
        Self {
            team,
            enemy,
            main_player_ord: None,
        }
        .normalized()
    }

    pub fn with_main_player(mut self, lamp_ord: usize) -> Self {
        self.main_player_ord = Some(lamp_ord);
        self
    }

    /// Force each player's side to the list it is in. Applied after
    /// deserialization, where the side field is optional.
    pub fn normalized(mut self) -> Self {
        for p in &mut self.team {
            p.side = Side::Team;
        }
        for p in &mut self.enemy {
            p.side = Side::Enemy;
        }
        self
    }

    /// Players on one side. `NoSide` has none.
    pub fn players(&self, side: Side) -> &[Player] {
        match side {
            Side::Team => &self.team,
            Side::Enemy => &self.enemy,
            Side::NoSide => &[],
        }
    }

    /// Player with the given lamp ordinal on `side`.
    pub fn player(&self, side: Side, lamp_ord: usize) -> Option<&Player> {
        self.players(side).iter().find(|p| p.lamp_ord == lamp_ord)
    }

    /// The recording player, if known.
    pub fn main_player(&self) -> Option<&Player> {
        self.main_player_ord
            .and_then(|ord| self.player(Side::Team, ord))
    }

    /// Every player, team first.
    pub fn all(&self) -> impl Iterator<Item = &Player> {
        self.team.iter().chain(self.enemy.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.team.is_empty() && self.enemy.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        Roster::new(
            vec![
                Player::new("Alpha", Side::NoSide, 0),
                Player::new("Bravo", Side::Team, 1),
            ],
            vec![Player::new("Foo", Side::Team, 0)],
        )
        .with_main_player(1)
    }

    #[test]
    fn test_roster_normalizes_sides() {
        let r = roster();
        assert!(r.players(Side::Team).iter().all(|p| p.side == Side::Team));
        assert_eq!(r.players(Side::Enemy)[0].side, Side::Enemy);
        assert!(r.players(Side::NoSide).is_empty());
    }

    #[test]
    fn test_main_player_lookup() {
        let r = roster();
        assert_eq!(r.main_player().map(|p| p.name.as_str()), Some("Bravo"));
        assert!(Roster::default().main_player().is_none());
        assert_eq!(r.all().count(), 3);
    }

    #[test]
    fn test_rule_initial_count() {
        assert_eq!(Rule::Area.initial_count(), 100);
        assert_eq!(Rule::Asari.initial_count(), 100);
        assert_eq!(Rule::Nawabari.initial_count(), 0);
        assert!(!Rule::Nawabari.is_countdown());
    }

    #[test]
    fn test_roster_json_without_sides() {
        let raw = r#"{
            "team": [ { "name": "Alpha", "lamp_ord": 0 } ],
            "enemy": [ { "name": "Foo", "lamp_ord": 0,
                         "loadout": { "main_label": "Splattershot", "sub_label": "Burst Bomb", "special_label": "Trizooka" } } ],
            "main_player_ord": 0
        }"#;
        let r: Roster = serde_json::from_str::<Roster>(raw).unwrap().normalized();
        assert_eq!(r.team[0].side, Side::Team);
        assert_eq!(r.enemy[0].side, Side::Enemy);
        assert_eq!(
            r.enemy[0].loadout.as_ref().map(|l| l.sub_label.as_str()),
            Some("Burst Bomb")
        );
    }
}
