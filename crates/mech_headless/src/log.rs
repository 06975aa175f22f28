//! Human-readable combat log.
//!
//! Renders purely from reports, so a log can be produced from saved JSON
//! without the engine that made it.

use std::fmt::Write;

use mech_core::attack::{AttackReport, AttackResult, EffectReport, PhaseReport};
use mech_core::unit::CommitReport;

use crate::runner::RunOutcome;

fn push_line(out: &mut String, indent: usize, text: &str) {
    let _ = writeln!(out, "{:indent$}{text}", "", indent = indent * 2);
}

/// One attack: declaration, to-hit breakdown, roll, damage and effects.
pub fn render_attack(attack: &AttackReport) -> String {
    let mut out = String::new();
    let roll = attack
        .roll
        .map_or_else(|| "no roll".to_string(), |r| format!("rolls {r}"));
    let verdict = match attack.result {
        AttackResult::Hit if attack.glancing => "glancing hit",
        AttackResult::Hit => "hit",
        AttackResult::Miss if attack.jammed => "jammed",
        AttackResult::Miss => "miss",
        AttackResult::Skipped => "not fired",
    };
    push_line(
        &mut out,
        1,
        &format!(
            "{} fires {} at {}: needs {} [{}], {roll}, {verdict}",
            attack.attacker_name,
            attack.weapon_name,
            attack.target_name,
            attack.outcome,
            attack.to_hit.full_description(),
        ),
    );
    if let Some(cluster) = attack.cluster {
        let cluster_roll = cluster.roll.map_or_else(|| "-".to_string(), |r| r.to_string());
        push_line(
            &mut out,
            2,
            &format!(
                "cluster {} rolls {cluster_roll} ({:+}): {} hit",
                cluster.size, cluster.modifier, cluster.hits
            ),
        );
    }
    for damage in &attack.damage {
        let side = if damage.rear { " (rear)" } else { "" };
        let via = if damage.transferred { "transfer " } else { "" };
        let doomed = if damage.doomed { ", destroyed" } else { "" };
        push_line(
            &mut out,
            2,
            &format!(
                "{via}{} to {}{side}: {} armor, {} internal{doomed}",
                damage.amount, damage.location, damage.armor, damage.internal
            ),
        );
    }
    for critical in &attack.criticals {
        push_line(
            &mut out,
            2,
            &format!(
                "critical hit in {} slot {}: {}",
                critical.location,
                critical.slot + 1,
                critical.component
            ),
        );
    }
    for (_, location) in &attack.blown_off {
        push_line(&mut out, 2, &format!("{location} blown off"));
    }
    for effect in &attack.effects {
        push_line(&mut out, 2, &render_effect(effect));
    }
    out
}

fn render_effect(effect: &EffectReport) -> String {
    match effect {
        EffectReport::AmmoExplosion { mount, damage, .. } => {
            format!("ammunition in mount {mount} explodes for {damage}")
        }
        EffectReport::MinefieldLaid { hex, density } => {
            format!("minefield of density {density} laid at {hex}")
        }
        EffectReport::TerrainIgnited { hex, burning } => {
            if *burning {
                format!("{hex} catches fire")
            } else {
                format!("{hex} fails to ignite")
            }
        }
        EffectReport::BuildingDamaged {
            hex,
            amount,
            remaining,
        } => match remaining {
            Some(cf) => format!("building at {hex} takes {amount}, {cf} left"),
            None => format!("no building at {hex}"),
        },
        EffectReport::BeaconAttached { unit } => format!("homing beacon attached to unit {unit}"),
        EffectReport::TargetDesignated { unit } => format!("unit {unit} designated"),
        EffectReport::PointDefenseInterception {
            defender,
            mount,
            cluster_modifier,
        } => format!(
            "point defense (unit {defender}, mount {mount}) intercepts, cluster {cluster_modifier:+}"
        ),
    }
}

fn render_commit(commit: &CommitReport) -> Option<String> {
    if commit.is_empty() {
        return None;
    }
    let mut parts = Vec::new();
    if !commit.destroyed_locations.is_empty() {
        let names: Vec<String> = commit
            .destroyed_locations
            .iter()
            .map(ToString::to_string)
            .collect();
        parts.push(format!("loses {}", names.join(", ")));
    }
    let lost = commit.destroyed_mounts.len() + commit.missing_mounts.len();
    if lost > 0 {
        parts.push(format!("{lost} equipment lost"));
    }
    if commit.crew_killed {
        parts.push("crew killed".to_string());
    }
    if commit.unit_destroyed {
        parts.push("DESTROYED".to_string());
    }
    Some(format!("unit {} {}", commit.unit, parts.join("; ")))
}

/// A whole phase with its commit.
pub fn render_phase(report: &PhaseReport) -> String {
    let mut out = String::new();
    push_line(&mut out, 0, &format!("Phase {}", report.phase));
    for attack in &report.attacks {
        out.push_str(&render_attack(attack));
    }
    for rejected in &report.rejected {
        push_line(
            &mut out,
            1,
            &format!(
                "unit {} mount {} refused: {}",
                rejected.declaration.attacker, rejected.declaration.weapon, rejected.reason
            ),
        );
    }
    for line in report.commits.iter().filter_map(render_commit) {
        push_line(&mut out, 1, &line);
    }
    out
}

/// A full run with final standings.
pub fn render_run(outcome: &RunOutcome) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        0,
        &format!("{} (seed {})", outcome.scenario, outcome.seed),
    );
    for played in &outcome.phases {
        if let Some(starts) = &played.round_start {
            for (unit, start) in starts.iter().enumerate() {
                if start.shutdown {
                    let line = format!("unit {unit} shuts down at heat {}", start.heat);
                    push_line(&mut out, 0, &line);
                }
            }
        }
        out.push_str(&render_phase(&played.report));
    }
    push_line(&mut out, 0, "Standings");
    for standing in &outcome.standings {
        let status = if standing.destroyed {
            "destroyed".to_string()
        } else {
            format!(
                "{} armor, {} internal, heat {}",
                standing.armor, standing.internal, standing.heat
            )
        };
        push_line(
            &mut out,
            1,
            &format!("{} (team {}): {status}", standing.name, standing.team),
        );
    }
    push_line(&mut out, 0, &format!("Final hash {:016x}", outcome.final_hash));
    out
}
