//! REPL command handlers
//!
//! Each handler prints its result to stdout. Errors come back as strings
//! for the prompt loop to display.

use std::io::Write;
use std::time::Duration;

use acsched_core::{Scheduler, TimerAction, TimerEntry};

use crate::config::AppConfig;

/// Parse `HH:MM` into hour and minute. Range checks are left to the
/// scheduler.
pub fn parse_time(value: &str) -> Result<(u8, u8), String> {
    let (hour, minute) = value
        .trim()
        .split_once(':')
        .ok_or_else(|| format!("invalid time '{value}' (expected HH:MM)"))?;

    let hour = hour
        .parse::<u8>()
        .map_err(|_| format!("invalid hour '{hour}'"))?;
    let minute = minute
        .parse::<u8>()
        .map_err(|_| format!("invalid minute '{minute}'"))?;
    Ok((hour, minute))
}

pub fn add(scheduler: &Scheduler, at: &str, action: TimerAction, daily: bool) -> Result<(), String> {
    let (hour, minute) = parse_time(at)?;
    let id = scheduler
        .add_timer(hour, minute, action, daily)
        .map_err(|e| e.to_string())?;
    println!("added timer {id}");
    Ok(())
}

pub fn remove(scheduler: &Scheduler, id: u8) -> Result<(), String> {
    scheduler.remove_timer(id).map_err(|e| e.to_string())?;
    println!("removed timer {id}");
    Ok(())
}

pub fn set_enabled(scheduler: &Scheduler, id: u8, enabled: bool) -> Result<(), String> {
    scheduler
        .set_enabled(id, enabled)
        .map_err(|e| e.to_string())?;
    let state = if enabled { "enabled" } else { "disabled" };
    println!("timer {id} {state}");
    Ok(())
}

pub fn fire(scheduler: &Scheduler, id: u8) -> Result<(), String> {
    scheduler.force_fire(id).map_err(|e| e.to_string())?;
    println!("timer {id} queued");
    Ok(())
}

pub fn show(scheduler: &Scheduler, id: u8) -> Result<(), String> {
    let entry = scheduler
        .get_timer(id)
        .ok_or_else(|| format!("timer id {id} is out of range"))?;
    print_header();
    print_entry(&entry);
    Ok(())
}

pub fn list(scheduler: &Scheduler) {
    let entries = scheduler.list_timers();
    if entries.is_empty() {
        println!("no active timers");
        return;
    }

    print_header();
    for entry in &entries {
        print_entry(entry);
    }
}

pub fn next(scheduler: &Scheduler) {
    let Some(next) = scheduler.next_alarm() else {
        println!("nothing scheduled");
        return;
    };

    let local = scheduler.timezone().local(next.at);
    let ids: Vec<String> = next.due.iter().map(u8::to_string).collect();
    println!(
        "next alarm at {} (in {}) for timer(s) {}",
        local.format("%Y-%m-%d %H:%M"),
        format_duration(next.delay),
        ids.join(", ")
    );

    if let Some(remaining) = scheduler.armed_in() {
        println!("alarm timer expires in {}", format_duration(remaining));
    }
}

pub fn save(scheduler: &Scheduler) -> Result<(), String> {
    scheduler.save_all().map_err(|e| e.to_string())?;
    println!("all timers saved");
    Ok(())
}

/// Apply a new offset and persist it in the application config.
pub fn timezone(
    scheduler: &Scheduler,
    config: &mut AppConfig,
    offset: i32,
    dst: i32,
) -> Result<(), String> {
    scheduler
        .set_timezone(offset, dst)
        .map_err(|e| e.to_string())?;

    config.scheduler.timezone.gmt_offset_secs = offset;
    config.scheduler.timezone.daylight_offset_secs = dst;
    if let Err(e) = config.save() {
        tracing::warn!(error = %e, "Failed to save configuration");
    }

    println!("time zone offset now {}s", offset + dst);
    Ok(())
}

pub fn exit() -> Result<(), String> {
    write!(std::io::stdout(), "quitting...").map_err(|e| e.to_string())?;
    std::io::stdout().flush().map_err(|e| e.to_string())?;
    Ok(())
}

fn print_header() {
    println!(
        "{:<4} {:<6} {:<6} {:<8} {:<7} {:<10}",
        "ID", "TIME", "ACTION", "ENABLED", "REPEAT", "LAST FIRED"
    );
    println!("{}", "-".repeat(46));
}

fn print_entry(entry: &TimerEntry) {
    let last_fired = match entry.last_fired_date {
        0 => "never".to_string(),
        date => date.to_string(),
    };
    println!(
        "{:<4} {:<6} {:<6} {:<8} {:<7} {:<10}",
        entry.id,
        entry.time_label(),
        entry.action,
        yes_no(entry.enabled),
        if entry.repeat_daily { "daily" } else { "once" },
        last_fired
    );
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}h{:02}m{:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}
