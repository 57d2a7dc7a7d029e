use crate::config::Config;
use crate::host::HostClock;
use crate::overlay::{hud_label, label_grey};
use crate::session::RateSession;
use crate::settings::{LoadedSettings, Settings};
use crate::sim::SimulatedHost;
use crate::terminal::{TerminalGuard, TerminalInput};
use anyhow::Context;
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
    QueueableCommand,
};
use std::io::{BufWriter, Write};
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub fn load_settings(cfg: &Config) -> Settings {
    let path = cfg.settings_path();
    let loaded = match Settings::load(path.as_deref()) {
        Ok(v) => v,
        Err(err) => {
            warn!(error = %err, path = ?path, "settings unreadable, using defaults");
            LoadedSettings {
                settings: Settings::default(),
                issues: Vec::new(),
            }
        }
    };
    loaded.log_issues();
    let mut settings = loaded.settings;
    cfg.apply_overrides(&mut settings);
    settings
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let settings = load_settings(&cfg);
    if cfg.dump_settings {
        println!("{}", settings.to_text());
        return Ok(());
    }

    let term = TerminalGuard::new()?;
    let mut out = BufWriter::new(TerminalGuard::stdout());
    let mut input = TerminalInput::new(term.key_release_events());

    let mut host = SimulatedHost::new();
    if cfg.chaos {
        host = host.with_chaos(cfg.chaos_seed, cfg.chaos_gap_secs);
    }
    let mut session = RateSession::new(&settings, &host);
    info!(
        policy = settings.policy.as_str(),
        activation = settings.activation.as_str(),
        adjust = settings.adjust.as_str(),
        "session started"
    );

    let frame_budget = Duration::from_secs_f32(1.0 / cfg.fps.max(1) as f32);
    let mut last_frame = Instant::now();
    let result = loop {
        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f32().max(1e-6);
        last_frame = now;

        if let Err(err) = input.pump() {
            break Err(err);
        }
        if input.quit_requested() || input.was_pressed("q") || input.was_pressed("esc") {
            break Ok(());
        }
        if input.was_pressed("p") {
            host.toggle_pause();
        }
        if input.was_pressed("c") {
            host.start_cutscene();
        }

        host.update(dt);
        session.tick(&mut host, &input, dt);

        if let Err(err) = draw(&mut out, &session, &host, &settings) {
            break Err(err);
        }

        let elapsed = now.elapsed();
        if elapsed < frame_budget {
            std::thread::sleep(frame_budget - elapsed);
        }
    };

    session.shutdown(&mut host);
    drop(term);
    result
}

fn draw(
    out: &mut impl Write,
    session: &RateSession,
    host: &SimulatedHost,
    settings: &Settings,
) -> anyhow::Result<()> {
    let (cols, rows) = terminal::size().context("get terminal size")?;
    let snapshot = session.snapshot();
    let state = session.controller().state();

    out.queue(terminal::Clear(ClearType::All))?;
    for (i, line) in status_lines(session, host, settings).iter().enumerate() {
        if i as u16 >= rows.saturating_sub(2) {
            break;
        }
        out.queue(cursor::MoveTo(0, i as u16))?;
        out.queue(Print(truncate_for_width(line, cols as usize)))?;
    }

    if let Some(label) = hud_label(&snapshot) {
        let grey = label_grey(label.alpha);
        let y = rows.saturating_sub(2);
        out.queue(cursor::MoveTo(2, y))?;
        out.queue(SetForegroundColor(Color::Rgb {
            r: grey,
            g: grey,
            b: grey,
        }))?;
        let suffix = if state.active { "  SLOW" } else { "" };
        out.queue(Print(format!("{}{}", label.text, suffix)))?;
        out.queue(ResetColor)?;
    }
    out.flush()?;
    Ok(())
}

fn status_lines(session: &RateSession, host: &SimulatedHost, settings: &Settings) -> Vec<String> {
    let controller = session.controller();
    let state = controller.state();
    vec![
        format!(
            "Host: {} | Rate: {:>5.3} | Sim time: {:>7.2}s | Real time: {:>7.2}s",
            host.phase().label(),
            host.get(),
            host.sim_time(),
            host.real_time()
        ),
        format!(
            "Control: {} | Baseline: {:>5.3} | Multiplier: {:>5.1}% | Applied: {:>5.3} | External changes: {}",
            if state.active { "on" } else { "off" },
            state.baseline,
            state.target_multiplier * 100.0,
            state.last_applied,
            controller.interference_count()
        ),
        format!(
            "Policy: {} | Activation: {} | Adjust: {}",
            controller.policy().as_str(),
            session.activation().as_str(),
            controller.adjust_mode().as_str()
        ),
        format!(
            "Keys: {} control | {}/{} adjust | p pause host | c cutscene | q quit",
            settings.toggle_control, settings.increase_control, settings.decrease_control
        ),
    ]
}

fn truncate_for_width(s: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out = s.chars().take(width.saturating_sub(1)).collect::<String>();
    out.push('~');
    out
}
