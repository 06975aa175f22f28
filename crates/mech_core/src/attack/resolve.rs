//! Roll, damage and secondary effects.
//!
//! [`resolve`] consumes an [`AimedAttack`]: it draws the to-hit roll,
//! spends the weapon's ammunition and heat, runs the family's damage
//! strategy, and drains the secondary-effect queue before returning the
//! report. Effects are processed first in, first out; an effect may queue
//! further effects (an ammo explosion striking another bin).

use std::collections::VecDeque;

use tracing::{debug, info};

use crate::archetype::CriticalChance;
use crate::board::{Battlefield, HexCoord, Side};
use crate::dice::Dice;
use crate::equipment::{MissileRack, MountId, WeaponDef, WeaponFamily, WeaponMode};
use crate::error::{CombatError, Result};
use crate::roll::RollOutcome;
use crate::rules::RulesConfig;
use crate::structure::SlotContent;
use crate::unit::{Unit, UnitId};

use super::cluster::{clamp_roll, cluster_hits};
use super::point_defense::guidance_bonus;
use super::{
    AimedAttack, AttackReport, AttackResult, ClusterRecord, CriticalRecord, DamageRecord,
    EffectReport, Target,
};

/// Work queued during resolution and processed before the report closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryEffect {
    /// Detonate an ammo bin.
    AmmoExplosion {
        /// Owner of the bin.
        unit: UnitId,
        /// Bin.
        mount: MountId,
    },
    /// Lay mines.
    MinefieldLaid {
        /// Hex.
        hex: HexCoord,
        /// Density.
        density: u32,
    },
    /// Set a hex alight.
    TerrainIgnited {
        /// Hex.
        hex: HexCoord,
    },
    /// Damage a building.
    BuildingDamaged {
        /// Hex.
        hex: HexCoord,
        /// Damage.
        amount: u32,
    },
    /// Attach a homing beacon.
    BeaconAttached {
        /// Unit tagged.
        unit: UnitId,
    },
    /// Designate a target.
    TargetDesignated {
        /// Unit designated.
        unit: UnitId,
    },
    /// Spend a point-defense mount's shot.
    PointDefenseInterception {
        /// Defending unit.
        defender: UnitId,
        /// Point-defense mount.
        mount: MountId,
    },
}

/// How a damage chain meets each location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    /// Armor first, rear layer when set.
    Armor { rear: bool },
    /// Straight to internal structure.
    Internal,
}

fn unit_ref(units: &[Unit], id: UnitId) -> Result<&Unit> {
    units.get(id as usize).ok_or(CombatError::UnitNotFound(id))
}

fn unit_mut(units: &mut [Unit], id: UnitId) -> Result<&mut Unit> {
    units.get_mut(id as usize).ok_or(CombatError::UnitNotFound(id))
}

/// Resolve an aimed attack.
///
/// # Errors
///
/// Returns [`CombatError::WeaponAlreadyFired`] if the weapon fired since
/// the attack was declared, or an arena lookup error if a unit or mount
/// vanished. Nothing is changed when an error is returned before the roll.
pub fn resolve(
    units: &mut [Unit],
    board: &mut dyn Battlefield,
    dice: &mut dyn Dice,
    rules: &RulesConfig,
    attack: AimedAttack,
) -> Result<AttackReport> {
    Resolver {
        units,
        board,
        dice,
        rules,
        queue: VecDeque::new(),
    }
    .run(&attack)
}

struct Resolver<'a> {
    units: &'a mut [Unit],
    board: &'a mut dyn Battlefield,
    dice: &'a mut dyn Dice,
    rules: &'a RulesConfig,
    queue: VecDeque<SecondaryEffect>,
}

impl Resolver<'_> {
    fn run(mut self, attack: &AimedAttack) -> Result<AttackReport> {
        let decl = *attack.declaration();
        let firer = unit_ref(self.units, decl.attacker)?;
        let mount = firer.mount(decl.weapon)?;
        if mount.used_this_round {
            return Err(CombatError::WeaponAlreadyFired {
                unit: decl.attacker,
                mount: decl.weapon,
            });
        }
        let weapon = mount.def.weapon().cloned().ok_or(CombatError::NotAWeapon {
            unit: decl.attacker,
            mount: decl.weapon,
        })?;
        let mode = mount.effective_mode();

        let mut report = AttackReport::new(decl, attack.to_hit().clone());
        report.attacker_name = firer.name().to_string();
        report.weapon_name = mount.name().to_string();
        report.target_name = match decl.target {
            Target::Unit(id) => self
                .units
                .get(id as usize)
                .map_or_else(|| decl.target.to_string(), |u| u.name().to_string()),
            Target::Hex(hex) => format!("hex {hex}"),
        };

        let (hit, margin) = match report.outcome {
            RollOutcome::SuppressedCheck => {
                report.result = AttackResult::Skipped;
                debug!(attacker = decl.attacker, weapon = decl.weapon, "check suppressed");
                return Ok(report);
            }
            RollOutcome::Impossible => {
                self.mark_used(decl.attacker, decl.weapon)?;
                report.result = AttackResult::Miss;
                debug!(
                    attacker = decl.attacker,
                    weapon = decl.weapon,
                    reason = %attack.to_hit().full_description(),
                    "attack impossible"
                );
                return Ok(report);
            }
            RollOutcome::AutomaticFail => (false, None),
            RollOutcome::AutomaticSuccess => (true, None),
            RollOutcome::Target(target) => {
                let roll = self.dice.roll_2d6();
                report.roll = Some(roll);
                let margin = i32::from(roll) - target;
                (margin >= 0, Some(margin))
            }
        };

        self.mark_used(decl.attacker, decl.weapon)?;
        let streak = matches!(weapon.family, WeaponFamily::Missile(rack) if rack.streak);
        if hit || !streak {
            self.fire(decl.attacker, decl.weapon, &weapon, &mut report)?;
        }
        if report.roll == Some(2) {
            self.fumble(decl.attacker, decl.weapon, mode, &mut report)?;
        }

        if hit && !report.jammed {
            report.result = AttackResult::Hit;
            report.glancing = self.rules.glancing_blows && margin == Some(0);
            self.apply_family(attack, &weapon, margin, &mut report)?;
        } else {
            report.result = AttackResult::Miss;
        }
        debug!(
            attacker = decl.attacker,
            weapon = decl.weapon,
            target = %decl.target,
            roll = ?report.roll,
            result = ?report.result,
            "attack resolved"
        );
        self.process_effects(&mut report)?;
        Ok(report)
    }

    fn mark_used(&mut self, unit: UnitId, weapon: MountId) -> Result<()> {
        unit_mut(self.units, unit)?.mount_mut(weapon)?.used_this_round = true;
        Ok(())
    }

    /// Spend ammunition and generate heat for the shots actually fired.
    fn fire(
        &mut self,
        unit: UnitId,
        weapon: MountId,
        def: &WeaponDef,
        report: &mut AttackReport,
    ) -> Result<()> {
        let firer = unit_mut(self.units, unit)?;
        let mount = firer.mount(weapon)?;
        let mut shots = mount.shots_per_attack();
        let linked = mount.linked_ammo;
        if def.ammo_type.is_some() {
            shots = match linked {
                Some(bin) => {
                    let bin = firer.mount_mut(bin)?;
                    let fired = shots.min(bin.shots);
                    bin.shots -= fired;
                    fired
                }
                None => 0,
            };
        }
        let heat = def.heat.saturating_mul(shots);
        firer.add_heat(heat);
        report.shots_fired = shots;
        report.heat_generated = heat;
        Ok(())
    }

    /// Natural 2: rapid-fire modes jam, hot-loaded racks cook off their bin.
    fn fumble(
        &mut self,
        unit: UnitId,
        weapon: MountId,
        mode: WeaponMode,
        report: &mut AttackReport,
    ) -> Result<()> {
        let mount = unit_mut(self.units, unit)?.mount_mut(weapon)?;
        if mode.can_jam() {
            mount.jammed = true;
            report.jammed = true;
            info!(unit, weapon, "weapon jammed");
        }
        if mode == WeaponMode::HotLoaded {
            if let Some(bin) = mount.linked_ammo {
                info!(unit, weapon, bin, "hot-loaded rack misfired");
                self.queue
                    .push_back(SecondaryEffect::AmmoExplosion { unit, mount: bin });
            }
        }
        Ok(())
    }

    fn apply_family(
        &mut self,
        attack: &AimedAttack,
        weapon: &WeaponDef,
        margin: Option<i32>,
        report: &mut AttackReport,
    ) -> Result<()> {
        let band = attack.band();
        let target = attack.declaration().target;
        let hex = attack.declared().target_position();
        match weapon.family {
            WeaponFamily::Energy { damage, .. } => {
                let amount = self.single_damage(damage.at(band), &weapon.family, margin, report);
                self.strike_target(target, attack.side(), &[amount], report)
            }
            WeaponFamily::Ballistic { damage, .. } if report.shots_fired > 1 => {
                let modifier = if report.glancing {
                    self.rules.glancing_cluster_modifier
                } else {
                    0
                };
                let hits = self.cluster_roll(report.shots_fired, modifier, report);
                let amounts = vec![damage.at(band); hits as usize];
                self.strike_target(target, attack.side(), &amounts, report)
            }
            WeaponFamily::Ballistic { damage, .. } => {
                let amount = self.single_damage(damage.at(band), &weapon.family, margin, report);
                self.strike_target(target, attack.side(), &[amount], report)
            }
            WeaponFamily::Missile(rack) => self.missile_volley(attack, rack, report),
            WeaponFamily::Flamer { damage, heat } => match target {
                Target::Unit(id) => {
                    let amount = self.single_damage(damage, &weapon.family, margin, report);
                    self.strike_target(target, attack.side(), &[amount], report)?;
                    unit_mut(self.units, id)?.add_heat(heat);
                    Ok(())
                }
                Target::Hex(hex) => {
                    self.queue.push_back(SecondaryEffect::TerrainIgnited { hex });
                    Ok(())
                }
            },
            WeaponFamily::MineDispenser { density } => {
                self.queue
                    .push_back(SecondaryEffect::MinefieldLaid { hex, density });
                Ok(())
            }
            WeaponFamily::Artillery { damage } => {
                let amount = self.single_damage(damage, &weapon.family, margin, report);
                let victims: Vec<UnitId> = self
                    .units
                    .iter()
                    .filter(|u| !u.is_destroyed() && u.position == hex)
                    .map(Unit::id)
                    .collect();
                let contents = self.board.hex_contents(hex);
                debug!(
                    %hex,
                    amount,
                    units = victims.len(),
                    building = ?contents.building,
                    "artillery impact"
                );
                for victim in victims {
                    self.strike(victim, Side::Front, amount, report)?;
                }
                if contents.building.is_some() {
                    self.queue
                        .push_back(SecondaryEffect::BuildingDamaged { hex, amount });
                }
                Ok(())
            }
            WeaponFamily::Designator => {
                if let Target::Unit(unit) = target {
                    self.queue
                        .push_back(SecondaryEffect::TargetDesignated { unit });
                }
                Ok(())
            }
            WeaponFamily::Beacon => {
                if let Target::Unit(unit) = target {
                    self.queue.push_back(SecondaryEffect::BeaconAttached { unit });
                }
                Ok(())
            }
            WeaponFamily::PointDefense => Ok(()),
        }
    }

    /// Damage of a single-hit weapon after glancing and direct blows.
    fn single_damage(
        &self,
        base: u32,
        family: &WeaponFamily,
        margin: Option<i32>,
        report: &mut AttackReport,
    ) -> u32 {
        let mut amount = if report.glancing { base / 2 } else { base };
        if self.rules.direct_blows && family.allows_direct_blow() {
            if let Some(margin) = margin.filter(|m| *m >= 3) {
                let bonus = (margin / 3) as u32;
                report.direct_blow_bonus = bonus;
                amount += bonus;
            }
        }
        amount
    }

    fn missile_volley(
        &mut self,
        attack: &AimedAttack,
        rack: MissileRack,
        report: &mut AttackReport,
    ) -> Result<()> {
        let mut modifier = guidance_bonus(self.units, &*self.board, self.rules, attack);
        if report.glancing {
            modifier += self.rules.glancing_cluster_modifier;
        }
        let intercepted = attack
            .point_defense()
            .copied()
            .filter(|_| self.rules.point_defense);
        if let Some(pd) = intercepted {
            modifier += self.rules.point_defense_cluster_modifier;
            self.queue
                .push_back(SecondaryEffect::PointDefenseInterception {
                    defender: pd.defender,
                    mount: pd.mount,
                });
        }
        let size = u32::from(rack.size);
        let missiles = if rack.streak && intercepted.is_none() && !report.glancing {
            report.cluster = Some(ClusterRecord {
                size,
                roll: None,
                modifier: 0,
                hits: size,
            });
            size
        } else {
            self.cluster_roll(size, modifier, report)
        };

        let group = u32::from(rack.group_size.max(1));
        let mut amounts = Vec::new();
        let mut left = missiles;
        while left > 0 {
            let n = left.min(group);
            amounts.push(n * rack.damage_per_missile);
            left -= n;
        }
        self.strike_target(attack.declaration().target, attack.side(), &amounts, report)
    }

    fn cluster_roll(&mut self, size: u32, modifier: i32, report: &mut AttackReport) -> u32 {
        let natural = self.dice.roll_2d6();
        let hits = cluster_hits(size, clamp_roll(i32::from(natural) + modifier));
        debug!(size, natural, modifier, hits, "cluster roll");
        report.cluster = Some(ClusterRecord {
            size,
            roll: Some(natural),
            modifier,
            hits,
        });
        hits
    }

    fn strike_target(
        &mut self,
        target: Target,
        side: Side,
        amounts: &[u32],
        report: &mut AttackReport,
    ) -> Result<()> {
        let Target::Unit(id) = target else {
            return Ok(());
        };
        for &amount in amounts {
            self.strike(id, side, amount, report)?;
        }
        Ok(())
    }

    /// One damage grouping: roll a hit location and run the damage chain.
    fn strike(
        &mut self,
        unit: UnitId,
        side: Side,
        amount: u32,
        report: &mut AttackReport,
    ) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let victim = unit_ref(self.units, unit)?;
        let hit = victim.archetype().hit_location(side, self.dice.roll_2d6());
        let Some(index) = victim.location_index(hit.kind) else {
            return Ok(());
        };
        let tac = hit.through_armor_critical.then_some(side);
        let records =
            self.damage_chain(unit, index, amount, Delivery::Armor { rear: hit.rear }, tac, report)?;
        report.damage.extend(records);
        Ok(())
    }

    /// Apply `amount` at `start` and follow the transfer chain inward until
    /// it is absorbed or reaches a location with no inward neighbour.
    fn damage_chain(
        &mut self,
        unit: UnitId,
        start: usize,
        amount: u32,
        delivery: Delivery,
        through_armor: Option<Side>,
        report: &mut AttackReport,
    ) -> Result<Vec<DamageRecord>> {
        let mut records = Vec::new();
        let mut index = start;
        let mut amount = amount;
        let mut transferred = false;
        loop {
            let victim = unit_mut(self.units, unit)?;
            let kind = victim.location(index)?.kind();
            let (dealt, rear) = match delivery {
                Delivery::Armor { rear } => (victim.apply_location_damage(index, amount, rear)?, rear),
                Delivery::Internal => (victim.apply_internal_damage(index, amount)?, false),
            };
            records.push(DamageRecord {
                unit,
                location: kind,
                rear,
                amount,
                armor: dealt.armor,
                internal: dealt.internal,
                transferred,
                doomed: dealt.doomed,
            });
            if dealt.armor + dealt.internal > 0 && victim.archetype().is_crew_critical(kind) {
                victim.wound_crew(self.rules.crew_hits_per_head_hit);
            }
            let next = victim.transfer_location(index)?;

            if dealt.doomed {
                self.location_lost(unit, index, report)?;
            } else if dealt.internal > 0 {
                self.critical_check(unit, index, report)?;
            } else if let Some(side) = through_armor.filter(|_| !transferred) {
                self.through_armor_critical(unit, index, side, report)?;
            }

            if dealt.remainder == 0 {
                break;
            }
            let Some(next) = next else {
                debug!(unit, location = %kind, remainder = dealt.remainder, "damage stops");
                break;
            };
            index = next;
            amount = dealt.remainder;
            transferred = true;
        }
        Ok(records)
    }

    fn location_lost(&mut self, unit: UnitId, index: usize, report: &mut AttackReport) -> Result<()> {
        let victim = unit_mut(self.units, unit)?;
        report
            .locations_doomed
            .push((unit, victim.location(index)?.kind()));
        for dependent in victim.destroy_dependent(index)? {
            report
                .locations_doomed
                .push((unit, victim.location(dependent)?.kind()));
        }
        Ok(())
    }

    fn through_armor_critical(
        &mut self,
        unit: UnitId,
        index: usize,
        side: Side,
        report: &mut AttackReport,
    ) -> Result<()> {
        let index = if self.rules.floating_crits {
            let victim = unit_ref(self.units, unit)?;
            let kind = victim.archetype().hit_location(side, self.dice.roll_2d6()).kind;
            victim.location_index(kind).unwrap_or(index)
        } else {
            index
        };
        if unit_ref(self.units, unit)?.location(index)?.is_lost() {
            return Ok(());
        }
        self.critical_check(unit, index, report)
    }

    fn critical_check(&mut self, unit: UnitId, index: usize, report: &mut AttackReport) -> Result<()> {
        let roll = self.dice.roll_2d6();
        let victim = unit_mut(self.units, unit)?;
        let kind = victim.location(index)?.kind();
        match victim.archetype().critical_chance(kind, roll) {
            CriticalChance::None => Ok(()),
            CriticalChance::BlownOff => {
                if victim.blow_off(index)? {
                    report.blown_off.push((unit, kind));
                    self.location_lost(unit, index, report)?;
                }
                Ok(())
            }
            CriticalChance::Slots(n) => {
                debug!(unit, location = %kind, roll, slots = n, "critical hit");
                for _ in 0..n {
                    self.critical_slot(unit, index, report)?;
                }
                Ok(())
            }
        }
    }

    /// Strike one hittable slot, passing inward from locations with
    /// nothing left to hit.
    fn critical_slot(&mut self, unit: UnitId, index: usize, report: &mut AttackReport) -> Result<()> {
        let mut index = index;
        let victim = unit_ref(self.units, unit)?;
        while victim.transfer_eligible(index)? {
            match victim.transfer_location(index)? {
                Some(next) => index = next,
                None => return Ok(()),
            }
        }
        let slots = victim.location(index)?.hittable_slots();
        let Some(&slot) = slots.get(self.dice.pick(slots.len())) else {
            return Ok(());
        };
        let victim = unit_mut(self.units, unit)?;
        let Some(content) = victim.mark_slot_hit(index, slot)? else {
            return Ok(());
        };
        let component = match content {
            SlotContent::Empty => "empty".to_string(),
            SlotContent::System(system) => format!("{system:?}"),
            SlotContent::Mount(mount) => victim.mount(mount)?.name().to_string(),
        };
        report.criticals.push(CriticalRecord {
            unit,
            location: victim.location(index)?.kind(),
            slot,
            component,
        });
        if let SlotContent::Mount(mount) = content {
            let live = victim.mount(mount)?;
            if live.shots > 0 && live.def.ammo().is_some_and(|a| a.explosive) {
                self.queue
                    .push_back(SecondaryEffect::AmmoExplosion { unit, mount });
            }
        }
        Ok(())
    }

    fn process_effects(&mut self, report: &mut AttackReport) -> Result<()> {
        while let Some(effect) = self.queue.pop_front() {
            let record = match effect {
                SecondaryEffect::AmmoExplosion { unit, mount } => {
                    self.explode(unit, mount, report)?
                }
                SecondaryEffect::MinefieldLaid { hex, density } => {
                    self.board.lay_minefield(hex, density);
                    Some(EffectReport::MinefieldLaid { hex, density })
                }
                SecondaryEffect::TerrainIgnited { hex } => {
                    let burning = self.board.ignite(hex);
                    Some(EffectReport::TerrainIgnited { hex, burning })
                }
                SecondaryEffect::BuildingDamaged { hex, amount } => {
                    let remaining = self.board.damage_building(hex, amount);
                    Some(EffectReport::BuildingDamaged {
                        hex,
                        amount,
                        remaining,
                    })
                }
                SecondaryEffect::BeaconAttached { unit } => {
                    unit_mut(self.units, unit)?.attach_beacon();
                    Some(EffectReport::BeaconAttached { unit })
                }
                SecondaryEffect::TargetDesignated { unit } => {
                    unit_mut(self.units, unit)?.designate();
                    Some(EffectReport::TargetDesignated { unit })
                }
                SecondaryEffect::PointDefenseInterception { defender, mount } => {
                    self.expend_point_defense(defender, mount)?;
                    Some(EffectReport::PointDefenseInterception {
                        defender,
                        mount,
                        cluster_modifier: self.rules.point_defense_cluster_modifier,
                    })
                }
            };
            if let Some(record) = record {
                report.effects.push(record);
            }
        }
        Ok(())
    }

    /// Detonate a bin: every remaining shot goes into internal structure
    /// at the bin's location and transfers inward.
    fn explode(
        &mut self,
        unit: UnitId,
        mount: MountId,
        report: &mut AttackReport,
    ) -> Result<Option<EffectReport>> {
        let bin = unit_mut(self.units, unit)?.mount_mut(mount)?;
        let Some(ammo) = bin.def.ammo() else {
            return Ok(None);
        };
        if !ammo.explosive || bin.shots == 0 {
            return Ok(None);
        }
        let damage = bin.shots.saturating_mul(ammo.damage_per_shot);
        let location = bin.location;
        bin.shots = 0;
        info!(unit, mount, damage, "ammunition exploded");
        let damage_records =
            self.damage_chain(unit, location, damage, Delivery::Internal, None, report)?;
        Ok(Some(EffectReport::AmmoExplosion {
            unit,
            mount,
            damage,
            damage_records,
        }))
    }

    fn expend_point_defense(&mut self, defender: UnitId, mount: MountId) -> Result<()> {
        let unit = unit_mut(self.units, defender)?;
        let pd = unit.mount(mount)?;
        let (heat, feeds) = match pd.def.weapon() {
            Some(def) => (def.heat, def.ammo_type.is_some()),
            None => return Ok(()),
        };
        if let Some(bin) = pd.linked_ammo.filter(|_| feeds) {
            let bin = unit.mount_mut(bin)?;
            bin.shots = bin.shots.saturating_sub(1);
        }
        unit.add_heat(heat);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::{LocationKind, UnitArchetype};
    use crate::attack::{declare, to_hit::aim, AttackDeclaration};
    use crate::board::{Facing, OpenField};
    use crate::dice::ScriptedDice;
    use crate::equipment::{
        EquipmentDef, EquipmentKind, EquipmentMount, RangeBands, WeaponDamage,
    };
    use crate::structure::{CriticalSlot, Location};
    use crate::unit::Crew;

    fn laser() -> EquipmentDef {
        EquipmentDef {
            name: "Medium Laser".to_string(),
            kind: EquipmentKind::Weapon(WeaponDef {
                family: WeaponFamily::Energy {
                    damage: WeaponDamage::Flat(5),
                    pulse: false,
                },
                ranges: RangeBands {
                    minimum: 0,
                    short: 3,
                    medium: 6,
                    long: 9,
                    extreme: 12,
                },
                heat: 3,
                ammo_type: None,
                to_hit_modifier: 0,
            }),
            slots: 1,
            hittable: true,
        }
    }

    fn walker(id: UnitId, team: u8) -> Unit {
        let archetype = UnitArchetype::Biped;
        let locations = archetype
            .locations()
            .iter()
            .map(|&kind| {
                let rear = kind.has_rear_armor().then_some(4);
                let slots = if kind == LocationKind::RightArm {
                    vec![CriticalSlot::mount(0, true)]
                } else {
                    vec![CriticalSlot::empty()]
                };
                Location::new(kind, 10, rear, 5, slots)
            })
            .collect();
        Unit::new(
            id,
            format!("Walker {id}"),
            archetype,
            team,
            locations,
            vec![EquipmentMount::new(laser(), 4, false)],
            Crew::new("Pilot", 4, 5),
            10,
        )
    }

    fn duel() -> Vec<Unit> {
        vec![
            walker(0, 1).at(HexCoord::new(0, 0), Facing(0)),
            walker(1, 2).at(HexCoord::new(0, -2), Facing(3)),
        ]
    }

    fn aimed(units: &[Unit], board: &OpenField) -> AimedAttack {
        let declared = declare(units, AttackDeclaration::at_unit(0, 0, 1));
        let declared = declared.unwrap_or_else(|e| panic!("declaration refused: {e}"));
        aim(units, board, &RulesConfig::default(), declared)
    }

    #[test]
    fn test_hit_damages_rolled_location() {
        let mut units = duel();
        let mut board = OpenField::new();
        let attack = aimed(&units, &board);
        assert_eq!(attack.to_hit().value(), RollOutcome::Target(4));
        let mut dice = ScriptedDice::new([8, 7]);
        let report = resolve(&mut units, &mut board, &mut dice, &RulesConfig::default(), attack);
        let report = report.unwrap_or_else(|e| panic!("resolution failed: {e}"));
        assert!(report.is_hit());
        assert_eq!(report.damage_to(1), 5);
        assert_eq!(report.damage[0].location, LocationKind::CenterTorso);
        assert_eq!(units[1].total_armor(), units[1].total_original_armor() - 5);
        assert_eq!(units[0].pending_heat(), 3);
        assert!(units[0].mounts()[0].used_this_round);
    }

    #[test]
    fn test_miss_still_fires() {
        let mut units = duel();
        let mut board = OpenField::new();
        let attack = aimed(&units, &board);
        let mut dice = ScriptedDice::new([3]);
        let report = resolve(&mut units, &mut board, &mut dice, &RulesConfig::default(), attack);
        let report = report.unwrap_or_else(|e| panic!("resolution failed: {e}"));
        assert_eq!(report.result, AttackResult::Miss);
        assert_eq!(report.heat_generated, 3);
        assert!(report.damage.is_empty());
        assert_eq!(units[1].total_armor(), units[1].total_original_armor());
    }

    #[test]
    fn test_impossible_spends_nothing() {
        let mut units = duel();
        units[0].set_heat(40);
        let mut board = OpenField::new();
        let attack = aimed(&units, &board);
        assert_eq!(attack.to_hit().value(), RollOutcome::Impossible);
        let mut dice = ScriptedDice::new([12]);
        let report = resolve(&mut units, &mut board, &mut dice, &RulesConfig::default(), attack);
        let report = report.unwrap_or_else(|e| panic!("resolution failed: {e}"));
        assert_eq!(report.roll, None);
        assert_eq!(report.heat_generated, 0);
        assert_eq!(dice.remaining(), 1);
        assert!(units[0].mounts()[0].used_this_round);
    }

    #[test]
    fn test_second_resolution_refused() {
        let mut units = duel();
        let mut board = OpenField::new();
        let first = aimed(&units, &board);
        let second = first.clone();
        let mut dice = ScriptedDice::new([8, 7]);
        let rules = RulesConfig::default();
        assert!(resolve(&mut units, &mut board, &mut dice, &rules, first).is_ok());
        assert_eq!(
            resolve(&mut units, &mut board, &mut dice, &rules, second),
            Err(CombatError::WeaponAlreadyFired { unit: 0, mount: 0 })
        );
    }

    #[test]
    fn test_direct_blow_adds_margin_damage() {
        let mut units = duel();
        let mut board = OpenField::new();
        let attack = aimed(&units, &board);
        let rules = RulesConfig {
            direct_blows: true,
            ..RulesConfig::default()
        };
        let mut dice = ScriptedDice::new([10, 7]);
        let report = resolve(&mut units, &mut board, &mut dice, &rules, attack);
        let report = report.unwrap_or_else(|e| panic!("resolution failed: {e}"));
        assert_eq!(report.direct_blow_bonus, 2);
        assert_eq!(report.damage_to(1), 7);
    }

    #[test]
    fn test_glancing_blow_halves_damage() {
        let mut units = duel();
        let mut board = OpenField::new();
        let attack = aimed(&units, &board);
        let rules = RulesConfig {
            glancing_blows: true,
            ..RulesConfig::default()
        };
        let mut dice = ScriptedDice::new([4, 7]);
        let report = resolve(&mut units, &mut board, &mut dice, &rules, attack);
        let report = report.unwrap_or_else(|e| panic!("resolution failed: {e}"));
        assert!(report.glancing);
        assert_eq!(report.damage_to(1), 2);
    }
}
