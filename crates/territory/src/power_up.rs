//! Power-ups: timed pickups that bend the rules for a few seconds.
//!
//! All timers are countdowns in simulation milliseconds, decremented once
//! per tick by [`PowerUpSystem::advance`].

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::entity::{Arena, Collectible, CollectibleKind};
use crate::rng::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    /// Player speed boost.
    Rabbit,
    /// Enemies slow down.
    Turtle,
    /// Invincibility, or vulnerable ghosts on ghost levels.
    Star,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [Self::Rabbit, Self::Turtle, Self::Star];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rabbit => "rabbit",
            Self::Turtle => "turtle",
            Self::Star => "star",
        }
    }

    pub fn random(rng: &mut Rng) -> Self {
        Self::ALL[rng.next_index(Self::ALL.len())]
    }
}

/// What a star does on this level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StarEffect {
    /// Enemy contact and trail cuts are ignored.
    #[default]
    Invincibility,
    /// Ghosts can be eaten; contact with the player is not otherwise forgiven.
    VulnerableEnemies,
}

/// Per-level power-up switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpRules {
    pub star: StarEffect,
    /// Enemies may pick up power-ups too.
    pub enemies_collect: bool,
}

/// What an enemy gets from a pickup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyPickup {
    /// The enemy runs faster for one effect duration.
    Boost,
    /// The enemy duplicates itself.
    Split,
    /// Consumed without effect.
    Wasted,
}

impl EnemyPickup {
    pub fn from_kind(kind: PowerUpKind) -> Self {
        match kind {
            PowerUpKind::Rabbit => Self::Boost,
            PowerUpKind::Star => Self::Split,
            PowerUpKind::Turtle => Self::Wasted,
        }
    }
}

/// Remaining milliseconds of each active effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EffectTimers {
    pub speed_boost_ms: u64,
    pub star_ms: u64,
    pub enemy_slow_ms: u64,
}

#[derive(Debug, Clone)]
pub struct PowerUpSystem {
    rules: PowerUpRules,
    spawn_interval_ms: u64,
    lifespan_ms: u64,
    effect_ms: u64,
    speed_boost_multiplier: f64,
    enemy_slow_multiplier: f64,
    until_spawn_ms: u64,
    timers: EffectTimers,
}

impl PowerUpSystem {
    pub fn new(rules: PowerUpRules, config: &GameConfig) -> Self {
        Self {
            rules,
            spawn_interval_ms: config.power_up_spawn_interval_ms,
            lifespan_ms: config.power_up_lifespan_ms,
            effect_ms: config.power_up_effect_ms,
            speed_boost_multiplier: config.speed_boost_multiplier,
            enemy_slow_multiplier: config.enemy_slow_multiplier,
            until_spawn_ms: config.power_up_spawn_interval_ms,
            timers: EffectTimers::default(),
        }
    }

    pub fn rules(&self) -> PowerUpRules {
        self.rules
    }

    pub fn timers(&self) -> EffectTimers {
        self.timers
    }

    /// How long a spawned power-up lies on the board.
    pub fn lifespan_ms(&self) -> u64 {
        self.lifespan_ms
    }

    pub fn effect_ms(&self) -> u64 {
        self.effect_ms
    }

    /// Count every timer down by `dt`. Returns true when a spawn is due.
    pub fn advance(&mut self, dt: u64) -> bool {
        let t = &mut self.timers;
        t.speed_boost_ms = t.speed_boost_ms.saturating_sub(dt);
        t.star_ms = t.star_ms.saturating_sub(dt);
        t.enemy_slow_ms = t.enemy_slow_ms.saturating_sub(dt);

        self.until_spawn_ms = self.until_spawn_ms.saturating_sub(dt);
        if self.until_spawn_ms == 0 {
            self.until_spawn_ms = self.spawn_interval_ms;
            return true;
        }
        false
    }

    /// The player picked up `kind`. Effects restart rather than stack.
    pub fn apply(&mut self, kind: PowerUpKind) {
        match kind {
            PowerUpKind::Rabbit => self.timers.speed_boost_ms = self.effect_ms,
            PowerUpKind::Turtle => self.timers.enemy_slow_ms = self.effect_ms,
            PowerUpKind::Star => self.timers.star_ms = self.effect_ms,
        }
    }

    pub fn player_speed_multiplier(&self) -> f64 {
        if self.timers.speed_boost_ms > 0 { self.speed_boost_multiplier } else { 1.0 }
    }

    pub fn enemy_speed_multiplier(&self) -> f64 {
        if self.timers.enemy_slow_ms > 0 { self.enemy_slow_multiplier } else { 1.0 }
    }

    /// Boost applied to an enemy that collected a rabbit.
    pub fn enemy_boost_multiplier(&self) -> f64 {
        self.speed_boost_multiplier
    }

    pub fn is_invincible(&self) -> bool {
        self.timers.star_ms > 0 && self.rules.star == StarEffect::Invincibility
    }

    pub fn enemies_vulnerable(&self) -> bool {
        self.timers.star_ms > 0 && self.rules.star == StarEffect::VulnerableEnemies
    }
}

/// Age power-ups lying on the board and drop the ones that ran out.
///
/// Returns how many were removed.
pub fn age_power_ups(items: &mut Arena<Collectible>, dt: u64) -> usize {
    for (_, item) in items.iter_mut() {
        if let CollectibleKind::PowerUp { remaining_ms, .. } = &mut item.kind {
            *remaining_ms = remaining_ms.saturating_sub(dt);
        }
    }

    let before = items.len();
    items.retain(|_, item| !matches!(item.kind, CollectibleKind::PowerUp { remaining_ms: 0, .. }));
    before - items.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn system(rules: PowerUpRules) -> PowerUpSystem {
        PowerUpSystem::new(rules, &GameConfig::default())
    }

    #[test]
    fn spawns_on_interval() {
        let mut sys = system(PowerUpRules::default());
        let due: Vec<bool> = (0..600).map(|_| sys.advance(10)).collect();
        // 3000 ms interval at 10 ms ticks: ticks 300 and 600
        assert_eq!(due.iter().filter(|d| **d).count(), 2);
        assert!(due[299]);
        assert!(due[599]);
    }

    #[test]
    fn effects_count_down() {
        let mut sys = system(PowerUpRules::default());
        sys.apply(PowerUpKind::Rabbit);
        assert_eq!(sys.player_speed_multiplier(), 1.5);

        for _ in 0..499 {
            sys.advance(10);
        }
        assert!(sys.player_speed_multiplier() > 1.0);
        sys.advance(10);
        assert_eq!(sys.player_speed_multiplier(), 1.0);
    }

    #[test]
    fn turtle_slows_enemies() {
        let mut sys = system(PowerUpRules::default());
        assert_eq!(sys.enemy_speed_multiplier(), 1.0);
        sys.apply(PowerUpKind::Turtle);
        assert_eq!(sys.enemy_speed_multiplier(), 0.3);
    }

    #[test]
    fn star_meaning_depends_on_rules() {
        let mut shield = system(PowerUpRules::default());
        shield.apply(PowerUpKind::Star);
        assert!(shield.is_invincible());
        assert!(!shield.enemies_vulnerable());

        let mut ghosts = system(PowerUpRules {
            star: StarEffect::VulnerableEnemies,
            enemies_collect: false,
        });
        ghosts.apply(PowerUpKind::Star);
        assert!(!ghosts.is_invincible());
        assert!(ghosts.enemies_vulnerable());
    }

    #[test]
    fn expired_items_leave_the_board() {
        let mut items = Arena::new();
        items.insert(Collectible::power_up(Point::new(0.0, 0.0), 8.0, PowerUpKind::Star, 20));
        items.insert(Collectible::apple(Point::new(5.0, 5.0), 8.0, 50));

        assert_eq!(age_power_ups(&mut items, 10), 0);
        assert_eq!(age_power_ups(&mut items, 10), 1);
        assert_eq!(items.len(), 1);
        assert!(items.values().all(Collectible::is_apple));
    }

    #[test]
    fn enemy_pickups() {
        assert_eq!(EnemyPickup::from_kind(PowerUpKind::Star), EnemyPickup::Split);
        assert_eq!(EnemyPickup::from_kind(PowerUpKind::Rabbit), EnemyPickup::Boost);
        assert_eq!(EnemyPickup::from_kind(PowerUpKind::Turtle), EnemyPickup::Wasted);
    }
}
