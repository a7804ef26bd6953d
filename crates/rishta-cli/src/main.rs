//! `rishta`: command-line client for the Rishta matrimonial service.
//!
//! # Usage
//!
//! ```
//! rishta login 9876543210
//! rishta verify 9876543210 123456
//! rishta discover --like
//! rishta search --religion Hindu --state Kerala
//! rishta --config ~/.config/rishta/rishta.toml listen --chat c1
//! ```

mod app;
mod render;
mod settings;

use std::{path::PathBuf, process::ExitCode};

use app::{Action, App};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rishta_core::{
  catalog,
  id::{ChatId, UserId},
  onboarding::ProfileForm,
  profile::{Gender, MaritalStatus},
  search::{FilterField, SearchFilters},
};
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "rishta", version, about = "Command-line client for the Rishta matrimonial service")]
struct Cli {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", default_value = "rishta.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Request a one-time code for a phone number.
  Login { phone: String },
  /// Verify the code and start a session.
  Verify { phone: String, otp: String },
  /// Exchange the session token for a fresh one.
  Refresh,
  /// End the session.
  Logout,
  /// Show the signed-in profile.
  Whoami,
  /// Complete the profile wizard.
  Onboard(OnboardArgs),
  /// Show the next candidate and optionally decide on them.
  Discover(DiscoverArgs),
  /// List every profile matching the filters.
  Search(FilterArgs),
  /// Show a candidate's full profile.
  Profile { id: String },
  /// Report a profile.
  Report {
    id:     String,
    #[arg(long)]
    reason: String,
  },
  /// Block a profile.
  Block { id: String },
  /// List mutual matches.
  Matches,
  /// List conversations.
  Chats,
  /// Start a conversation with a match.
  StartChat { with: String },
  /// Show a conversation's messages.
  Messages {
    chat:      String,
    /// Also mark the conversation as read.
    #[arg(long)]
    mark_read: bool,
  },
  /// Send a message.
  Send { chat: String, text: String },
  /// Print realtime events until interrupted.
  Listen {
    /// Join this conversation's room once connected.
    #[arg(long)]
    chat: Option<String>,
  },
  /// Print the choices offered for a profile field.
  Options {
    #[arg(value_enum)]
    field:    OptionField,
    /// Religion whose castes to list.
    #[arg(long)]
    religion: Option<String>,
  },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OptionField {
  Religions,
  Castes,
  Education,
  Professions,
  Income,
  Heights,
  States,
  MaritalStatus,
}

#[derive(Args, Debug)]
struct OnboardArgs {
  #[arg(long)]
  first_name:     String,
  #[arg(long)]
  last_name:      String,
  #[arg(long)]
  email:          Option<String>,
  /// Date of birth, `YYYY-MM-DD`.
  #[arg(long)]
  dob:            NaiveDate,
  #[arg(long, value_parser = parse_gender)]
  gender:         Gender,
  /// Height label such as `5'7"`.
  #[arg(long)]
  height:         String,
  #[arg(long)]
  religion:       String,
  #[arg(long)]
  caste:          String,
  #[arg(long)]
  sub_caste:      Option<String>,
  #[arg(long, value_parser = parse_marital_status)]
  marital_status: MaritalStatus,
  #[arg(long)]
  education:      String,
  #[arg(long)]
  profession:     String,
  #[arg(long)]
  income:         Option<String>,
  #[arg(long)]
  city:           String,
  #[arg(long)]
  state:          String,
  #[arg(long)]
  bio:            Option<String>,
  /// JPEG to upload as the profile picture.
  #[arg(long, value_name = "FILE")]
  photo:          Option<PathBuf>,
}

impl OnboardArgs {
  fn form(&self) -> ProfileForm {
    let mut form = ProfileForm {
      first_name: self.first_name.clone(),
      last_name: self.last_name.clone(),
      email: self.email.clone(),
      date_of_birth: Some(self.dob),
      gender: Some(self.gender),
      height: self.height.clone(),
      marital_status: Some(self.marital_status),
      education: self.education.clone(),
      profession: self.profession.clone(),
      income: self.income.clone(),
      city: self.city.clone(),
      state: self.state.clone(),
      bio: self.bio.clone(),
      ..ProfileForm::default()
    };
    form.set_religion(self.religion.clone());
    form.caste = self.caste.clone();
    form.sub_caste = self.sub_caste.clone();
    form
  }
}

/// Search-screen filters. Anything left out keeps the screen's default.
#[derive(Args, Debug)]
struct FilterArgs {
  #[arg(long)]
  age_min:     Option<String>,
  #[arg(long)]
  age_max:     Option<String>,
  #[arg(long)]
  height_min:  Option<String>,
  #[arg(long)]
  height_max:  Option<String>,
  #[arg(long = "religion")]
  religions:   Vec<String>,
  #[arg(long = "education")]
  educations:  Vec<String>,
  #[arg(long = "profession")]
  professions: Vec<String>,
  #[arg(long = "marital-status")]
  marital:     Vec<String>,
  #[arg(long = "city")]
  cities:      Vec<String>,
  #[arg(long = "state")]
  states:      Vec<String>,
  /// Search radius around the chosen places, in kilometres.
  #[arg(long)]
  radius:      Option<u32>,
}

impl FilterArgs {
  fn is_empty(&self) -> bool {
    self.age_min.is_none()
      && self.age_max.is_none()
      && self.height_min.is_none()
      && self.height_max.is_none()
      && self.radius.is_none()
      && [
        &self.religions,
        &self.educations,
        &self.professions,
        &self.marital,
        &self.cities,
        &self.states,
      ]
      .iter()
      .all(|values| values.is_empty())
  }

  fn filters(&self) -> SearchFilters {
    let mut filters = SearchFilters::default();
    if let Some(v) = &self.age_min {
      filters.age_min = v.clone();
    }
    if let Some(v) = &self.age_max {
      filters.age_max = v.clone();
    }
    if let Some(v) = &self.height_min {
      filters.height_min = v.clone();
    }
    if let Some(v) = &self.height_max {
      filters.height_max = v.clone();
    }
    if let Some(radius) = self.radius {
      filters.radius = radius;
    }
    let groups = [
      (FilterField::Religions, &self.religions),
      (FilterField::Educations, &self.educations),
      (FilterField::Professions, &self.professions),
      (FilterField::MaritalStatuses, &self.marital),
      (FilterField::Cities, &self.cities),
      (FilterField::States, &self.states),
    ];
    for (field, values) in groups {
      for value in values {
        filters.toggle(field, value);
      }
    }
    filters
  }
}

#[derive(Args, Debug)]
struct DiscoverArgs {
  #[command(flatten)]
  filters: FilterArgs,

  /// Like the current candidate.
  #[arg(long, conflicts_with_all = ["pass", "dx"])]
  like: bool,
  /// Pass on the current candidate.
  #[arg(long, conflicts_with = "dx")]
  pass: bool,
  /// Simulate releasing a drag at this horizontal offset (points).
  #[arg(long, allow_negative_numbers = true)]
  dx:   Option<f32>,
}

impl DiscoverArgs {
  /// Discovery is unfiltered unless a filter flag was given.
  fn filters(&self) -> Option<SearchFilters> {
    (!self.filters.is_empty()).then(|| self.filters.filters())
  }

  fn action(&self) -> Option<Action> {
    if self.like {
      Some(Action::Like)
    } else if self.pass {
      Some(Action::Pass)
    } else {
      self.dx.map(Action::Swipe)
    }
  }
}

fn parse_gender(s: &str) -> Result<Gender, String> {
  Gender::parse(s).ok_or_else(|| format!("expected `male` or `female`, got `{s}`"))
}

fn parse_marital_status(s: &str) -> Result<MaritalStatus, String> {
  MaritalStatus::parse(s).ok_or_else(|| {
    let choices: Vec<_> = MaritalStatus::ALL.iter().map(|m| m.as_str()).collect();
    format!("expected one of {}, got `{s}`", choices.join(", "))
  })
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  if let Command::Options { field, religion } = &cli.command {
    print_options(*field, religion.as_deref());
    return Ok(ExitCode::SUCCESS);
  }

  let settings = Settings::load(&cli.config)?;
  let mut app = App::open(settings).await?;

  match run(&mut app, cli.command).await {
    Ok(()) => Ok(ExitCode::SUCCESS),
    Err(e) => match e.downcast_ref::<rishta_core::Error>() {
      Some(err) => {
        tracing::debug!(error = %err, "command failed");
        eprintln!("{}", err.user_message());
        Ok(ExitCode::FAILURE)
      }
      None => Err(e),
    },
  }
}

async fn run(app: &mut App, command: Command) -> anyhow::Result<()> {
  match command {
    Command::Login { phone } => app.login(&phone).await,
    Command::Verify { phone, otp } => app.verify(&phone, &otp).await,
    Command::Refresh => app.refresh().await,
    Command::Logout => app.logout().await,
    Command::Whoami => app.whoami(),
    Command::Onboard(args) => app.onboard(args.form(), args.photo.as_deref()).await,
    Command::Discover(args) => app.discover(args.filters().as_ref(), args.action()).await,
    Command::Search(args) => app.search(&args.filters()).await,
    Command::Profile { id } => app.profile(&UserId::new(id)).await,
    Command::Report { id, reason } => app.report(&UserId::new(id), &reason).await,
    Command::Block { id } => app.block(&UserId::new(id)).await,
    Command::Matches => app.matches().await,
    Command::Chats => app.chats().await,
    Command::StartChat { with } => app.start_chat(&UserId::new(with)).await,
    Command::Messages { chat, mark_read } => app.messages(&ChatId::new(chat), mark_read).await,
    Command::Send { chat, text } => app.send(&ChatId::new(chat), &text).await,
    Command::Listen { chat } => app.listen(chat.map(ChatId::new).as_ref()).await,
    Command::Options { field, religion } => {
      print_options(field, religion.as_deref());
      Ok(())
    }
  }
}

fn print_options(field: OptionField, religion: Option<&str>) {
  let owned;
  let options: &[&str] = match field {
    OptionField::Religions => catalog::RELIGIONS,
    OptionField::Castes => catalog::castes_for(religion.unwrap_or_default()),
    OptionField::Education => catalog::EDUCATION_LEVELS,
    OptionField::Professions => catalog::PROFESSIONS,
    OptionField::Income => catalog::INCOME_RANGES,
    OptionField::Heights => catalog::HEIGHTS,
    OptionField::States => catalog::INDIAN_STATES,
    OptionField::MaritalStatus => {
      owned = MaritalStatus::ALL.map(MaritalStatus::as_str);
      &owned
    }
  };
  for option in options {
    println!("{option}");
  }
}
