//! Output formatting for CLI client commands.

use crate::ipc::protocol::ProximityDescriptor;

use super::daemon_client::{StatusReport, Transition};

/// Print the result of a call_added / call_removed request.
pub fn print_call_event(verb: &str, call: &str, proximity: Option<&ProximityDescriptor>) {
    match proximity {
        Some(p) => println!(
            "Call {call} {verb} ({} active, sensor {})",
            p.calls,
            sensor_state(p)
        ),
        None => println!("Call {call} {verb}"),
    }
}

/// Print the outcome of an on/off request.
pub fn print_transition(result: &Transition) {
    match &result.proximity {
        Some(p) => println!("{} (sensor {})", result.outcome, sensor_state(p)),
        None => println!("{}", result.outcome),
    }
}

/// Print coordinator state and registered calls.
pub fn print_status(report: &StatusReport) {
    let p = &report.proximity;
    println!("Supported:    {}", yes_no(p.supported));
    println!("Quirk:        {}", yes_no(p.quirk_platform));
    println!("Sensor:       {}", sensor_state(p));
    println!("Lock held:    {}", yes_no(p.lock_held));
    println!("Tap-to-wake:  {}", format_shadow(p.tap_to_wake_shadow));

    if report.calls.is_empty() {
        println!("No active calls");
        return;
    }
    println!("CALLS");
    println!("{}", "-".repeat(40));
    for call in &report.calls {
        println!("{call}");
    }
}

fn sensor_state(p: &ProximityDescriptor) -> &'static str {
    if !p.supported {
        "unsupported"
    } else if p.engaged {
        "engaged"
    } else {
        "idle"
    }
}

/// Remembered tap-to-wake value, shown only while engaged.
fn format_shadow(shadow: Option<bool>) -> &'static str {
    match shadow {
        Some(true) => "was on",
        Some(false) => "was off",
        None => "-",
    }
}

fn yes_no(v: bool) -> &'static str {
    if v { "yes" } else { "no" }
}
