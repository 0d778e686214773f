use std::fmt::Write as _;

use serde_json::{Map as JsonMap, Value as JsonValue, json};
use tomb_core::codec::ItemStats;
use tomb_core::gameflow::GameFlow;
use tomb_core::layout::{FileLayout, SectionId};
use tomb_core::slots::SlotList;
use tomb_core::start_info::{BonusFlags, StartFlags, StartInfo};
use tomb_core::summary::SaveSummary;

/// Game ticks per second of the level timer.
const TICKS_PER_SECOND: u32 = 30;
const LABEL_WIDTH: usize = 12;
const SECTION_WIDTH: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    #[default]
    CanonicalV1,
}

pub fn render_summary_json(summary: &SaveSummary, flow: &GameFlow, style: JsonStyle) -> JsonValue {
    match style {
        JsonStyle::CanonicalV1 => JsonValue::Object(summary_json(summary, flow)),
    }
}

pub fn render_slots_json(slots: &SlotList, style: JsonStyle) -> JsonValue {
    match style {
        JsonStyle::CanonicalV1 => {
            let entries = slots
                .entries
                .iter()
                .enumerate()
                .map(|(slot, entry)| {
                    json!({
                        "slot": slot,
                        "text": entry.text,
                        "available": !entry.blocked,
                    })
                })
                .collect();

            let mut out = JsonMap::new();
            out.insert("requested".to_string(), json!(slots.requested));
            out.insert("line_offset".to_string(), json!(slots.line_offset));
            out.insert("slots".to_string(), JsonValue::Array(entries));
            JsonValue::Object(out)
        }
    }
}

pub fn render_layout_json(layout: &FileLayout, style: JsonStyle) -> JsonValue {
    match style {
        JsonStyle::CanonicalV1 => {
            let validation = layout.validate();
            let sections = layout
                .sections
                .iter()
                .map(|section| {
                    json!({
                        "id": section_name(section.id),
                        "start": section.range.start,
                        "end": section.range.end,
                        "len": section.range.len(),
                    })
                })
                .collect();

            let mut out = JsonMap::new();
            out.insert("file_len".to_string(), json!(layout.file_len));
            out.insert("section_count".to_string(), json!(layout.sections.len()));
            out.insert("validation_ok".to_string(), json!(validation.is_ok()));
            if let Err(e) = validation {
                out.insert("validation_error".to_string(), json!(e.to_string()));
            }
            out.insert("sections".to_string(), JsonValue::Array(sections));
            JsonValue::Object(out)
        }
    }
}

fn summary_json(summary: &SaveSummary, flow: &GameFlow) -> JsonMap<String, JsonValue> {
    let mut out = JsonMap::new();
    out.insert("title".to_string(), json!(summary.title));
    out.insert("counter".to_string(), json!(summary.counter));
    out.insert("level".to_string(), json!(summary.level));
    out.insert(
        "level_title".to_string(),
        json!(flow.level_title(summary.level as usize)),
    );
    out.insert("timer".to_string(), json!(summary.timer));
    out.insert("time".to_string(), json!(format_timer(summary.timer)));
    out.insert("kills".to_string(), json!(summary.kills));
    out.insert("secrets".to_string(), json!(summary.secrets.count_ones()));
    out.insert("pickups".to_string(), json!(summary.pickups));
    out.insert("bonus".to_string(), json!(bonus_names(summary.bonus)));
    out.insert("item_stats".to_string(), item_stats_to_json(&summary.item_stats));
    out.insert("flip_status".to_string(), json!(summary.flip_status));
    out.insert("flip_table".to_string(), json!(summary.flip_table));
    out.insert(
        "start_info".to_string(),
        JsonValue::Array(
            summary
                .start
                .iter()
                .enumerate()
                .map(|(level, start)| start_info_to_json(level, start, flow))
                .collect(),
        ),
    );
    out.insert("file_len".to_string(), json!(summary.file_len));
    out
}

fn start_info_to_json(level: usize, start: &StartInfo, flow: &GameFlow) -> JsonValue {
    json!({
        "level": level,
        "title": flow.level_title(level),
        "available": start.flags.contains(StartFlags::AVAILABLE),
        "weapons": weapon_names(start.flags),
        "pistol_ammo": start.pistol_ammo,
        "magnum_ammo": start.magnum_ammo,
        "uzi_ammo": start.uzi_ammo,
        "shotgun_ammo": start.shotgun_ammo,
        "medipacks": start.num_medis,
        "large_medipacks": start.num_big_medis,
        "scions": start.num_scions,
        "gun_type": start.gun_type,
        "gun_status": start.gun_status,
        "costume": start.flags.contains(StartFlags::COSTUME),
    })
}

fn item_stats_to_json(stats: &ItemStats) -> JsonValue {
    json!({
        "pickup1": stats.pickup1,
        "pickup2": stats.pickup2,
        "puzzle1": stats.puzzle1,
        "puzzle2": stats.puzzle2,
        "puzzle3": stats.puzzle3,
        "puzzle4": stats.puzzle4,
        "key1": stats.key1,
        "key2": stats.key2,
        "key3": stats.key3,
        "key4": stats.key4,
        "leadbar": stats.leadbar,
    })
}

pub fn render_summary_text(summary: &SaveSummary, flow: &GameFlow) -> String {
    let mut out = String::new();
    writeln!(out, "{:<LABEL_WIDTH$}{}", "Title:", summary.title)
        .expect("writing to String cannot fail");
    writeln!(out, "{:<LABEL_WIDTH$}{}", "Counter:", summary.counter)
        .expect("writing to String cannot fail");
    writeln!(
        out,
        "{:<LABEL_WIDTH$}{} ({})",
        "Level:",
        summary.level,
        flow.level_title(summary.level as usize)
    )
    .expect("writing to String cannot fail");
    writeln!(out, "{:<LABEL_WIDTH$}{}", "Time:", format_timer(summary.timer))
        .expect("writing to String cannot fail");
    writeln!(out, "{:<LABEL_WIDTH$}{}", "Kills:", summary.kills)
        .expect("writing to String cannot fail");
    writeln!(
        out,
        "{:<LABEL_WIDTH$}{}",
        "Secrets:",
        summary.secrets.count_ones()
    )
    .expect("writing to String cannot fail");
    writeln!(out, "{:<LABEL_WIDTH$}{}", "Pickups:", summary.pickups)
        .expect("writing to String cannot fail");

    let bonus = bonus_names(summary.bonus);
    if !bonus.is_empty() {
        writeln!(out, "{:<LABEL_WIDTH$}{}", "Bonus:", bonus.join(", "))
            .expect("writing to String cannot fail");
    }

    writeln!(out).expect("writing to String cannot fail");
    writeln!(out, " ::: Levels :::").expect("writing to String cannot fail");
    for (level, start) in summary.start.iter().enumerate() {
        if !start.flags.contains(StartFlags::AVAILABLE) {
            continue;
        }
        let weapons = weapon_names(start.flags);
        let weapons = if weapons.is_empty() {
            "none".to_string()
        } else {
            weapons.join(" ")
        };
        let line = format!(
            "  {level:>2}  {:<24} {:<28} medi {}/{}",
            fit_column(flow.level_title(level), 24),
            weapons,
            start.num_medis,
            start.num_big_medis,
        );
        writeln!(out, "{}", line.trim_end()).expect("writing to String cannot fail");
    }
    out
}

pub fn render_slots_text(slots: &SlotList) -> String {
    let mut out = String::new();
    for (slot, entry) in slots.entries.iter().enumerate() {
        let marker = if slot == slots.requested && !entry.blocked {
            '>'
        } else {
            ' '
        };
        writeln!(out, "{marker} {:>2}  {}", slot + 1, entry.text)
            .expect("writing to String cannot fail");
    }
    out
}

pub fn render_layout_text(layout: &FileLayout) -> String {
    let mut out = String::new();
    for section in &layout.sections {
        writeln!(
            out,
            "{:<SECTION_WIDTH$}{:>6}..{:<6} {:>5} bytes",
            section_label(section.id),
            section.range.start,
            section.range.end,
            section.range.len()
        )
        .expect("writing to String cannot fail");
    }
    let status = match layout.validate() {
        Ok(()) => format!("layout ok, {} bytes", layout.file_len),
        Err(e) => format!("layout invalid: {e}"),
    };
    writeln!(out, "{status}").expect("writing to String cannot fail");
    out
}

fn section_name(id: SectionId) -> &'static str {
    match id {
        SectionId::Title => "title",
        SectionId::Counter => "counter",
        SectionId::StartInfo => "start_info",
        SectionId::Aggregate => "aggregate",
        SectionId::ItemStats => "item_stats",
        SectionId::FlipStatus => "flip_status",
        SectionId::FlipTable => "flip_table",
        SectionId::Cameras => "cameras",
        SectionId::Item(_) => "item",
        SectionId::Player => "player",
        SectionId::Trailer => "trailer",
        SectionId::Body => "body",
    }
}

fn section_label(id: SectionId) -> String {
    match id {
        SectionId::Item(index) => format!("item[{index}]"),
        other => section_name(other).to_string(),
    }
}

fn weapon_names(flags: StartFlags) -> Vec<&'static str> {
    [
        (StartFlags::GOT_PISTOLS, "pistols"),
        (StartFlags::GOT_MAGNUMS, "magnums"),
        (StartFlags::GOT_UZIS, "uzis"),
        (StartFlags::GOT_SHOTGUN, "shotgun"),
    ]
    .into_iter()
    .filter(|(flag, _)| flags.contains(*flag))
    .map(|(_, name)| name)
    .collect()
}

fn bonus_names(bonus: BonusFlags) -> Vec<&'static str> {
    let mut names = Vec::new();
    if bonus.contains(BonusFlags::NG_PLUS) {
        names.push("new_game_plus");
    }
    if bonus.contains(BonusFlags::JAPANESE) {
        names.push("japanese");
    }
    names
}

fn format_timer(ticks: u32) -> String {
    let seconds = ticks / TICKS_PER_SECOND;
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    )
}

fn fit_column(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width <= 3 {
        return value.chars().take(width).collect();
    }

    let mut out: String = value.chars().take(width - 3).collect();
    out.push_str("...");
    out
}
