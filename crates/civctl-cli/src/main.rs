// civctl -- read and set an Icom transceiver's clock, and read its
// frequency and mode, over CI-V.
//
// Usage:
//   civctl --port /dev/ttyUSB0 time get
//   civctl --port /dev/ttyUSB0 time set --at 21:07
//   civctl --port /dev/ttyUSB0 date set
//   civctl --port COM3 --controller-addr 0xC0 freq
//   civctl --mock sync
//
// Every command opens the serial port, runs one CI-V exchange, and closes
// the port again. `sync` reads the clock, sets it to UTC now, reads it back,
// does the same for the date, and finishes with frequency and mode.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime, Timelike, Utc};
use clap::{ArgAction, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use civctl_core::{format_dmy, format_freq_mhz, format_hhmm, CivAddress, Mode};
use civctl_icom::bcd::{encode_date, encode_time, freq_to_bcd};
use civctl_icom::commands::Operation;
use civctl_icom::{AckPolicy, CivBuilder, CivClient};
use civctl_test_harness::{MockConnector, MockTransport};
use civctl_transport::DEFAULT_BAUD_RATE;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// civctl -- Icom CI-V clock sync and status tool.
#[derive(Parser, Debug)]
#[command(name = "civctl", version, about)]
struct Cli {
    /// Serial port path (e.g. /dev/ttyUSB0, COM3).
    /// Required unless --mock is used.
    #[arg(long, env = "CIVCTL_PORT")]
    port: Option<String>,

    /// Serial baud rate. Must match the radio's "CI-V USB Baud Rate" menu.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Radio CI-V address (hex, e.g. 0x94).
    #[arg(long, default_value = "0x94", value_parser = parse_hex_u8)]
    radio_addr: u8,

    /// Controller CI-V address (hex, e.g. 0xE0).
    #[arg(long, default_value = "0xE0", value_parser = parse_hex_u8)]
    controller_addr: u8,

    /// Reply window per command, in milliseconds.
    #[arg(long, default_value_t = 500)]
    timeout_ms: u64,

    /// Fail set commands unless the radio answers with an ACK.
    #[arg(long)]
    require_ack: bool,

    /// Talk to a scripted in-memory radio instead of a serial port.
    #[arg(long)]
    mock: bool,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Parse a hex string like "0x94" or "94" into a u8.
fn parse_hex_u8(s: &str) -> std::result::Result<u8, String> {
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u8::from_str_radix(s, 16).map_err(|e| format!("invalid hex byte: {e}"))
}

/// Parse "HH:MM" into a time of day.
fn parse_hhmm(s: &str) -> std::result::Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| format!("expected HH:MM: {e}"))
}

/// Parse "YYYY-MM-DD" into a calendar date.
fn parse_ymd(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clock time operations.
    Time {
        #[command(subcommand)]
        action: TimeAction,
    },

    /// Clock date operations.
    Date {
        #[command(subcommand)]
        action: DateAction,
    },

    /// Read the operating frequency.
    Freq,

    /// Read the operating mode.
    Mode,

    /// Read, set to UTC now, and re-read the clock; then read frequency and mode.
    Sync,
}

#[derive(Subcommand, Debug)]
enum TimeAction {
    /// Read the radio's clock time.
    Get,
    /// Set the radio's clock time.
    Set {
        /// Time to set (HH:MM). Defaults to the current UTC time.
        #[arg(long, value_parser = parse_hhmm)]
        at: Option<NaiveTime>,
    },
}

#[derive(Subcommand, Debug)]
enum DateAction {
    /// Read the radio's clock date.
    Get,
    /// Set the radio's clock date.
    Set {
        /// Date to set (YYYY-MM-DD). Defaults to the current UTC date.
        #[arg(long, value_parser = parse_ymd)]
        on: Option<NaiveDate>,
    },
}

// ---------------------------------------------------------------------------
// Command plan
// ---------------------------------------------------------------------------

/// One CI-V exchange, with any value to send already resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    GetTime,
    SetTime(NaiveTime),
    GetDate,
    SetDate(NaiveDate),
    Frequency,
    Mode,
}

impl Step {
    fn operation(&self) -> Operation {
        match self {
            Step::GetTime => Operation::ReadTime,
            Step::SetTime(_) => Operation::SetTime,
            Step::GetDate => Operation::ReadDate,
            Step::SetDate(_) => Operation::SetDate,
            Step::Frequency => Operation::ReadFrequency,
            Step::Mode => Operation::ReadMode,
        }
    }
}

/// Current UTC time, truncated to the minute the radio can hold.
fn utc_now_minute() -> NaiveTime {
    let now = Utc::now().time();
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

/// Resolve a command into the exchanges it performs.
fn plan(command: &Command) -> Vec<Step> {
    match command {
        Command::Time { action } => match action {
            TimeAction::Get => vec![Step::GetTime],
            TimeAction::Set { at } => vec![Step::SetTime(at.unwrap_or_else(utc_now_minute))],
        },
        Command::Date { action } => match action {
            DateAction::Get => vec![Step::GetDate],
            DateAction::Set { on } => {
                vec![Step::SetDate(on.unwrap_or_else(|| Utc::now().date_naive()))]
            }
        },
        Command::Freq => vec![Step::Frequency],
        Command::Mode => vec![Step::Mode],
        Command::Sync => {
            let now = Utc::now();
            vec![
                Step::GetTime,
                Step::SetTime(utc_now_minute()),
                Step::GetTime,
                Step::GetDate,
                Step::SetDate(now.date_naive()),
                Step::GetDate,
                Step::Frequency,
                Step::Mode,
            ]
        }
    }
}

// ---------------------------------------------------------------------------
// Scripted radio for --mock
// ---------------------------------------------------------------------------

/// What the scripted radio reports before any set command changes it.
const MOCK_FREQUENCY_HZ: u64 = 14_074_000;
const MOCK_MODE: Mode = Mode::USB;
const MOCK_FILTER: u8 = 0x01;

fn mock_initial_time() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn mock_initial_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Script one transport per step, answering the way an IC-7300 does.
///
/// Set commands update the scripted clock, so a later read reports the new
/// value.
fn mock_connector(addr: CivAddress, steps: &[Step]) -> Result<MockConnector> {
    let connector = MockConnector::new();
    // Replies travel radio -> controller.
    let reply_addr = CivAddress::new(addr.controller, addr.radio);
    let ack = civctl_icom::civ::encode_frame(
        addr.controller,
        addr.radio,
        civctl_icom::civ::ACK,
        None,
        &[],
    );
    let mut time = mock_initial_time();
    let mut date = mock_initial_date();

    for step in steps {
        let op = step.operation();
        let spec = op.spec();
        // (request payload, reply payload)
        let (payload, data) = match *step {
            Step::GetTime => (Vec::new(), encode_time(time).to_vec()),
            Step::SetTime(t) => {
                time = t;
                (encode_time(t).to_vec(), Vec::new())
            }
            Step::GetDate => (Vec::new(), encode_date(date)?.to_vec()),
            Step::SetDate(d) => {
                date = d;
                (encode_date(d)?.to_vec(), Vec::new())
            }
            Step::Frequency => (Vec::new(), freq_to_bcd(MOCK_FREQUENCY_HZ).to_vec()),
            Step::Mode => (Vec::new(), vec![MOCK_MODE.code(), MOCK_FILTER]),
        };
        let reply = if op.is_read() {
            spec.frame(reply_addr, &data)
        } else {
            ack.clone()
        };
        let mut transport = MockTransport::new();
        transport.expect(&spec.frame(addr, &payload), &reply);
        connector.push(transport);
    }
    Ok(connector)
}

// ---------------------------------------------------------------------------
// Client construction
// ---------------------------------------------------------------------------

fn builder_from_cli(cli: &Cli) -> CivBuilder {
    let ack_policy = if cli.require_ack {
        AckPolicy::Require
    } else {
        AckPolicy::Ignore
    };
    CivBuilder::new()
        .radio_address(cli.radio_addr)
        .controller_address(cli.controller_addr)
        .baud_rate(cli.baud)
        .command_timeout(Duration::from_millis(cli.timeout_ms))
        .ack_policy(ack_policy)
}

fn create_client(cli: &Cli, steps: &[Step]) -> Result<CivClient> {
    let builder = builder_from_cli(cli);

    if cli.mock {
        let connector = mock_connector(builder.config().address, steps)
            .context("failed to script mock radio")?;
        info!("Using mock radio at {}", builder.config().address);
        return Ok(builder.build_client_with_connector(Box::new(connector)));
    }

    let port = cli
        .port
        .as_deref()
        .context("--port (or CIVCTL_PORT) is required when not using --mock")?;
    debug!(port, baud = cli.baud, "using serial port");
    builder
        .serial_port(port)
        .build_client()
        .with_context(|| format!("failed to configure serial port {port} at {} baud", cli.baud))
}

// ---------------------------------------------------------------------------
// Step execution
// ---------------------------------------------------------------------------

/// A value read back from the radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reading {
    Time(NaiveTime),
    Date(NaiveDate),
    Frequency(u64),
    Mode(Mode),
}

/// The line printed for a reading.
fn describe(reading: Reading) -> String {
    match reading {
        Reading::Time(t) => format!("The current time on the radio is {}", format_hhmm(t)),
        Reading::Date(d) => format!("The current date on the radio is {}", format_dmy(d)),
        Reading::Frequency(hz) => format!(
            "The current frequency on the radio is {} ({hz} Hz)",
            format_freq_mhz(hz)
        ),
        Reading::Mode(mode) => format!("The current mode on the radio is {mode}"),
    }
}

/// Run one exchange. Reads return what they got; sets return `None`.
async fn run_step(client: &CivClient, step: Step) -> Result<Option<Reading>> {
    let reading = match step {
        Step::GetTime => {
            info!("Getting time from the radio");
            let t = client.get_time().await.context("failed to read clock time")?;
            Some(Reading::Time(t))
        }
        Step::SetTime(t) => {
            info!("Setting the time on the radio to {}", format_hhmm(t));
            client.set_time(t).await.context("failed to set clock time")?;
            None
        }
        Step::GetDate => {
            info!("Getting date from the radio");
            let d = client.get_date().await.context("failed to read clock date")?;
            Some(Reading::Date(d))
        }
        Step::SetDate(d) => {
            info!("Setting the date on the radio to {}", format_dmy(d));
            client.set_date(d).await.context("failed to set clock date")?;
            None
        }
        Step::Frequency => {
            info!("Getting frequency from the radio");
            let hz = client
                .get_frequency()
                .await
                .context("failed to read frequency")?;
            Some(Reading::Frequency(hz))
        }
        Step::Mode => {
            info!("Getting mode from the radio");
            let mode = client.get_mode().await.context("failed to read mode")?;
            Some(Reading::Mode(mode))
        }
    };
    Ok(reading)
}

async fn run_plan(client: &CivClient, steps: &[Step]) -> Result<()> {
    for step in steps {
        if let Some(reading) = run_step(client, *step).await? {
            println!("{}", describe(reading));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let steps = plan(&cli.command);
    let client = create_client(&cli, &steps)?;
    run_plan(&client, &steps).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_u8_accepts_prefixes() {
        assert_eq!(parse_hex_u8("0x94"), Ok(0x94));
        assert_eq!(parse_hex_u8("0XE0"), Ok(0xE0));
        assert_eq!(parse_hex_u8("c0"), Ok(0xC0));
        assert!(parse_hex_u8("0x1FF").is_err());
        assert!(parse_hex_u8("zz").is_err());
    }

    #[test]
    fn parse_hhmm_and_ymd() {
        assert_eq!(parse_hhmm("06:05"), Ok(NaiveTime::from_hms_opt(6, 5, 0).unwrap()));
        assert!(parse_hhmm("25:00").is_err());
        assert_eq!(
            parse_ymd("2026-10-16"),
            Ok(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
        );
        assert!(parse_ymd("16-10-2026").is_err());
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["civctl", "--mock", "freq"]).unwrap();
        assert_eq!(cli.radio_addr, 0x94);
        assert_eq!(cli.controller_addr, 0xE0);
        assert_eq!(cli.baud, 115_200);
        assert_eq!(cli.timeout_ms, 500);
        assert!(!cli.require_ack);
        assert!(matches!(cli.command, Command::Freq));
    }

    #[test]
    fn cli_time_set_at() {
        let cli = Cli::try_parse_from([
            "civctl",
            "--port",
            "/dev/ttyUSB0",
            "--controller-addr",
            "0xC0",
            "time",
            "set",
            "--at",
            "21:07",
        ])
        .unwrap();
        assert_eq!(cli.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(cli.controller_addr, 0xC0);
        assert_eq!(
            plan(&cli.command),
            vec![Step::SetTime(NaiveTime::from_hms_opt(21, 7, 0).unwrap())]
        );
    }

    #[test]
    fn cli_rejects_bad_address() {
        assert!(Cli::try_parse_from(["civctl", "--radio-addr", "0xG1", "freq"]).is_err());
    }

    #[test]
    fn sync_plan_order() {
        let steps = plan(&Command::Sync);
        let ops: Vec<Operation> = steps.iter().map(Step::operation).collect();
        assert_eq!(
            ops,
            vec![
                Operation::ReadTime,
                Operation::SetTime,
                Operation::ReadTime,
                Operation::ReadDate,
                Operation::SetDate,
                Operation::ReadDate,
                Operation::ReadFrequency,
                Operation::ReadMode,
            ]
        );
    }

    #[test]
    fn utc_now_minute_has_no_seconds() {
        let t = utc_now_minute();
        assert_eq!(t.second(), 0);
        assert_eq!(t.nanosecond(), 0);
    }

    #[tokio::test]
    async fn sync_against_mock_radio() {
        let cli = Cli::try_parse_from(["civctl", "--mock", "--require-ack", "sync"]).unwrap();
        let steps = plan(&cli.command);
        let client = create_client(&cli, &steps).unwrap();
        run_plan(&client, &steps).await.unwrap();
    }

    #[tokio::test]
    async fn mock_radio_reports_set_values() {
        let addr = CivAddress::new(0x94, 0xC0);
        let t = NaiveTime::from_hms_opt(7, 45, 0).unwrap();
        let steps = [Step::SetTime(t), Step::GetTime];
        let connector = mock_connector(addr, &steps).unwrap();
        let client = CivBuilder::new()
            .controller_address(0xC0)
            .build_client_with_connector(Box::new(connector));

        client.set_time(t).await.unwrap();
        assert_eq!(client.get_time().await.unwrap(), t);
    }

    #[tokio::test]
    async fn mock_radio_frequency_and_mode() {
        let addr = CivAddress::default();
        let connector = mock_connector(addr, &[Step::Frequency, Step::Mode]).unwrap();
        let client = CivBuilder::new().build_client_with_connector(Box::new(connector));

        assert_eq!(client.get_frequency().await.unwrap(), MOCK_FREQUENCY_HZ);
        assert_eq!(client.get_mode().await.unwrap(), Mode::USB);
    }

    #[test]
    fn missing_port_is_an_error() {
        let mut cli = Cli::try_parse_from(["civctl", "mode"]).unwrap();
        // Ignore any CIVCTL_PORT in the environment.
        cli.port = None;
        let err = create_client(&cli, &plan(&cli.command)).err().unwrap();
        assert!(err.to_string().contains("--port"));
    }

    #[test]
    fn describe_readings() {
        assert_eq!(
            describe(Reading::Frequency(14_074_000)),
            "The current frequency on the radio is 14.074000 MHz (14074000 Hz)"
        );
        assert_eq!(
            describe(Reading::Time(NaiveTime::from_hms_opt(7, 5, 0).unwrap())),
            "The current time on the radio is 0705"
        );
        assert_eq!(
            describe(Reading::Date(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())),
            "The current date on the radio is 16-10-2026"
        );
        assert_eq!(
            describe(Reading::Mode(Mode::CWR)),
            "The current mode on the radio is CW-R"
        );
    }

    #[tokio::test]
    async fn freq_step_renders_single_unit() {
        let connector = mock_connector(CivAddress::default(), &[Step::Frequency]).unwrap();
        let client = CivBuilder::new().build_client_with_connector(Box::new(connector));

        let reading = run_step(&client, Step::Frequency).await.unwrap().unwrap();
        let line = describe(reading);
        assert_eq!(line.matches("MHz").count(), 1, "{line}");
        assert_eq!(
            line,
            "The current frequency on the radio is 14.074000 MHz (14074000 Hz)"
        );
    }

    #[tokio::test]
    async fn set_step_has_no_reading() {
        let t = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        let connector = mock_connector(CivAddress::default(), &[Step::SetTime(t)]).unwrap();
        let client = CivBuilder::new().build_client_with_connector(Box::new(connector));

        assert_eq!(run_step(&client, Step::SetTime(t)).await.unwrap(), None);
    }
}
