//! Economy: money, stats, inventory and the item catalogue
//!
//! Kills pay out money between rounds; the shop turns money into items and
//! items into stats. The stats are only read when the next live unit is
//! built at the start of a round.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use glam::Vec2;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::PER_SECOND;
use crate::sim::unit::{Unit, Vitals, Weapon};

/// Inventory capacity
pub const INVENTORY_SLOTS: usize = 4;
/// Items offered per shop visit
pub const OFFER_SLOTS: usize = 3;
/// Money at the start of a game
pub const STARTING_MONEY: u32 = 1000;
/// Every stat starts here
pub const STARTING_STAT: i32 = 2;
/// Items that are always on offer, crafted from nothing
pub const BASE_ITEMS: [&str; 5] = ["Armor", "Battery", "Magnifier", "Plasma", "Socks"];
/// Offer weight of a base item; craftable items weigh 3
const BASE_WEIGHT: u32 = 1;
const CRAFT_WEIGHT: u32 = 3;

const BUILTIN_CATALOGUE: &str = include_str!("../data/shop.json");

#[derive(Debug, Error)]
pub enum ShopError {
    #[error("slot {0} is empty")]
    EmptySlot(usize),

    #[error("no item named {0:?} in the catalogue")]
    UnknownItem(String),

    #[error("item costs {cost} but only {money} is available")]
    InsufficientFunds { cost: u32, money: u32 },

    #[error("missing materials or inventory space for {0:?}")]
    CannotCraft(String),

    #[error("failed to read catalogue: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed catalogue: {0}")]
    Catalogue(#[from] serde_json::Error),
}

/// Upgradeable unit stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stat {
    Reload,
    Damage,
    Speed,
    Agility,
    Recovery,
}

impl Stat {
    pub const ALL: [Stat; 5] = [
        Stat::Reload,
        Stat::Damage,
        Stat::Speed,
        Stat::Agility,
        Stat::Recovery,
    ];
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub reload: i32,
    pub damage: i32,
    pub speed: i32,
    pub agility: i32,
    pub recovery: i32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            reload: STARTING_STAT,
            damage: STARTING_STAT,
            speed: STARTING_STAT,
            agility: STARTING_STAT,
            recovery: STARTING_STAT,
        }
    }
}

impl Stats {
    pub fn get(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Reload => self.reload,
            Stat::Damage => self.damage,
            Stat::Speed => self.speed,
            Stat::Agility => self.agility,
            Stat::Recovery => self.recovery,
        }
    }

    fn get_mut(&mut self, stat: Stat) -> &mut i32 {
        match stat {
            Stat::Reload => &mut self.reload,
            Stat::Damage => &mut self.damage,
            Stat::Speed => &mut self.speed,
            Stat::Agility => &mut self.agility,
            Stat::Recovery => &mut self.recovery,
        }
    }

    fn apply(&mut self, deltas: &BTreeMap<Stat, i32>, sign: i32) {
        for (&stat, &delta) in deltas {
            *self.get_mut(stat) += sign * delta;
        }
    }

    /// Stat value fed into the unit formulas; never negative
    fn level(&self, stat: Stat) -> f32 {
        self.get(stat).max(0) as f32
    }

    /// Frames between shots
    pub fn reload_time(&self) -> u32 {
        let rate = (self.level(Stat::Reload) / 3.0).powi(2) + 0.3;
        (PER_SECOND as f32 / rate) as u32
    }

    /// Damage per second, before reload scaling
    pub fn damage_per_second(&self) -> f32 {
        ((self.level(Stat::Damage) / 1.4).powf(1.5) + 1.0).round()
    }

    /// Damage per bullet
    pub fn damage(&self) -> f32 {
        self.damage_per_second() * self.reload_time() as f32 / PER_SECOND as f32
    }

    pub fn max_speed(&self) -> f32 {
        3.0 + self.level(Stat::Agility)
    }

    pub fn bullet_speed(&self) -> f32 {
        7.0 + 2.0 * self.level(Stat::Speed)
    }

    /// Speed regained per frame after a hit
    pub fn recovery(&self) -> f32 {
        (self.level(Stat::Recovery) / 2.0 - 5.0).exp() * self.max_speed()
    }
}

/// One catalogue entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub cost: u32,
    /// 1 = bronze, 2 = silver, 3 = gold
    pub tier: u8,
    /// Items consumed when crafting this one
    #[serde(default)]
    pub materials: BTreeMap<String, usize>,
    #[serde(default)]
    pub stats: BTreeMap<Stat, i32>,
}

/// Every item the shop knows, in offer order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalogue {
    items: Vec<Item>,
}

impl Catalogue {
    pub fn from_json(json: &str) -> Result<Self, ShopError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ShopError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let catalogue = Self::from_json(&json)?;
        log::info!(
            "Loaded {} shop items from {}",
            catalogue.items.len(),
            path.as_ref().display()
        );
        Ok(catalogue)
    }

    /// The catalogue shipped with the game
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_CATALOGUE).unwrap_or_else(|e| {
            log::error!("Built-in catalogue is malformed: {}", e);
            Self::default()
        })
    }

    /// Load from `path`, or fall back to the built-in catalogue
    pub fn load_or_builtin(path: Option<&Path>) -> Self {
        match path.map(Self::load) {
            Some(Ok(catalogue)) => catalogue,
            Some(Err(e)) => {
                log::warn!("Using built-in catalogue: {}", e);
                Self::builtin()
            }
            None => Self::builtin(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The player's persistent progress between rounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Economy {
    pub stats: Stats,
    pub money: u32,
    pub inventory: [Option<String>; INVENTORY_SLOTS],
    pub offers: [Option<String>; OFFER_SLOTS],
    catalogue: Catalogue,
}

impl Default for Economy {
    fn default() -> Self {
        Self::new(Catalogue::builtin())
    }
}

impl Economy {
    pub fn new(catalogue: Catalogue) -> Self {
        Self {
            stats: Stats::default(),
            money: STARTING_MONEY,
            inventory: Default::default(),
            offers: Default::default(),
            catalogue,
        }
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn collect(&mut self, reward: u32) {
        self.money = self.money.saturating_add(reward);
        log::debug!("Collected ${} (now ${})", reward, self.money);
    }

    fn count(&self, name: &str) -> usize {
        self.inventory
            .iter()
            .filter(|slot| slot.as_deref() == Some(name))
            .count()
    }

    /// Whether the materials for `name` are in the inventory and the result
    /// would fit
    pub fn can_craft(&self, name: &str) -> bool {
        let Some(item) = self.catalogue.get(name) else {
            return false;
        };
        let mut space = self.inventory.iter().filter(|slot| slot.is_none()).count();
        for (material, &count) in &item.materials {
            // Consuming a material frees its slot
            space += 1;
            if self.count(material) < count {
                return false;
            }
        }
        space > 0
    }

    /// Empty an inventory slot, taking its stats away
    fn remove(&mut self, slot: usize) -> Result<String, ShopError> {
        let name = self
            .inventory
            .get_mut(slot)
            .and_then(Option::take)
            .ok_or(ShopError::EmptySlot(slot))?;
        if let Some(item) = self.catalogue.get(&name) {
            self.stats.apply(&item.stats, -1);
        }
        Ok(name)
    }

    fn craft(&mut self, name: &str) -> Result<(), ShopError> {
        let item = self
            .catalogue
            .get(name)
            .ok_or_else(|| ShopError::UnknownItem(name.to_string()))?
            .clone();
        for (material, &count) in &item.materials {
            for _ in 0..count {
                let slot = self
                    .inventory
                    .iter()
                    .position(|s| s.as_deref() == Some(material.as_str()))
                    .ok_or_else(|| ShopError::CannotCraft(name.to_string()))?;
                self.remove(slot)?;
            }
        }
        let free = self
            .inventory
            .iter()
            .position(Option::is_none)
            .ok_or_else(|| ShopError::CannotCraft(name.to_string()))?;
        self.inventory[free] = Some(item.name.clone());
        self.stats.apply(&item.stats, 1);
        Ok(())
    }

    /// Buy the item offered in `slot`
    pub fn purchase(&mut self, slot: usize) -> Result<(), ShopError> {
        let name = self
            .offers
            .get(slot)
            .cloned()
            .flatten()
            .ok_or(ShopError::EmptySlot(slot))?;
        let cost = self
            .catalogue
            .get(&name)
            .ok_or_else(|| ShopError::UnknownItem(name.clone()))?
            .cost;
        if cost > self.money {
            return Err(ShopError::InsufficientFunds {
                cost,
                money: self.money,
            });
        }
        if !self.can_craft(&name) {
            return Err(ShopError::CannotCraft(name));
        }

        self.craft(&name)?;
        self.money -= cost;
        self.offers[slot] = None;
        log::info!("Bought {} for ${}", name, cost);
        Ok(())
    }

    /// Sell the item in inventory `slot` back at full price
    pub fn sell(&mut self, slot: usize) -> Result<(), ShopError> {
        let name = self.remove(slot)?;
        let refund = self.catalogue.get(&name).map_or(0, |item| item.cost);
        self.money = self.money.saturating_add(refund);
        log::info!("Sold {} for ${}", name, refund);
        Ok(())
    }

    /// Roll a fresh set of offers
    ///
    /// Base items are always available; anything craftable from the current
    /// inventory joins them at triple weight. No item is offered twice.
    pub fn refresh<R: Rng>(&mut self, rng: &mut R) {
        let mut available: Vec<(&str, u32)> = BASE_ITEMS
            .iter()
            .filter(|name| self.catalogue.get(name).is_some())
            .map(|&name| (name, BASE_WEIGHT))
            .collect();
        for item in self.catalogue.items() {
            let name = item.name.as_str();
            if !BASE_ITEMS.contains(&name) && self.can_craft(name) {
                available.push((name, CRAFT_WEIGHT));
            }
        }

        let mut offers: [Option<String>; OFFER_SLOTS] = Default::default();
        for offer in offers.iter_mut() {
            let Ok(dist) = WeightedIndex::new(available.iter().map(|&(_, w)| w)) else {
                break;
            };
            let (name, _) = available.remove(dist.sample(rng));
            *offer = Some(name.to_string());
        }
        self.offers = offers;
    }

    /// Readout of a stat as the unit will experience it
    pub fn describe(&self, stat: Stat) -> String {
        let fps = PER_SECOND as f32;
        let (val, unit) = match stat {
            Stat::Reload => (fps / self.stats.reload_time().max(1) as f32, "bullets/s"),
            Stat::Damage => (self.stats.damage_per_second(), "dps"),
            Stat::Speed => (self.stats.bullet_speed() * fps, "px/s"),
            Stat::Agility => (self.stats.max_speed() * fps, "px/s"),
            Stat::Recovery => (self.stats.recovery() * fps, "(px/s)/s"),
        };
        format!("{:.2} {}", val, unit)
    }

    /// Build the next live unit from the current stats and inventory
    pub fn create_player(&self, pos: Vec2, uid: u32) -> Unit {
        let mut unit = Unit::player(uid, pos, 0);
        let max_speed = self.stats.max_speed();
        unit.reload_time = self.stats.reload_time();
        unit.damage = self.stats.damage();
        unit.bullet_speed = self.stats.bullet_speed();
        unit.vitals = Vitals::Agility {
            speed: max_speed,
            max_speed,
            recovery: self.stats.recovery(),
        };

        let weapon = self.inventory.iter().flatten().find_map(|name| Weapon::from_item(name));
        if let Some(weapon) = weapon {
            unit.main_gun = weapon;
            unit.gun = weapon;
        }
        unit
    }
}
