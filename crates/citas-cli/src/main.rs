//! Citas - book barbershop appointments from the terminal.
//!
//! The terminal plays the part of the web page: notifications are printed
//! to stderr and the session survives between runs in durable storage.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use crossterm::style::{style, Color, Stylize};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use citas_core::models::{Appointment, NewAppointment, Registration};
use citas_core::utils::{format_date, format_optional, format_phone, format_price, truncate_string};
use citas_core::{ApiClient, Config, Notification, NotificationArea, NotificationKind, Page};

// ============================================================================
// Constants
// ============================================================================

/// Accepted formats for `book --at`
const APPOINTMENT_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

/// Column width for service descriptions
const DESCRIPTION_WIDTH: usize = 48;

#[derive(Parser)]
#[command(name = "citas", version, about = "Reserva citas en la barbería")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Iniciar sesión
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Crear una cuenta nueva
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Cerrar sesión
    Logout,
    /// Mostrar el usuario actual
    Whoami,
    /// Listar servicios activos
    Services {
        /// Solo los servicios de este profesional
        #[arg(long)]
        professional: Option<i64>,
    },
    /// Listar profesionales activos
    Professionals,
    /// Reservar una cita
    Book {
        #[arg(long)]
        service: i64,
        #[arg(long)]
        professional: i64,
        /// Fecha y hora, p. ej. 2025-03-15T14:30
        #[arg(long)]
        at: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Próximas citas
    Upcoming,
    /// Historial de citas
    History,
    /// Cancelar una cita
    Cancel {
        /// Número de la cita
        id: i64,
    },
}

/// Initialize the tracing subscriber for logging.
///
/// `RUST_LOG` controls the level (default `warn`). With `CITAS_LOG_FILE=1`
/// a daily log file is also written to the data directory. Runs before the
/// config is loaded, so it only relies on the default data directory.
fn init_tracing() -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = if std::env::var("CITAS_LOG_FILE").is_ok_and(|v| v == "1") {
        let appender = tracing_appender::rolling::daily(Config::default().data_dir()?, "citas.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().with_ansi(false).with_writer(writer)),
            Some(guard),
        )
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    Ok(guard)
}

fn render_notification(notification: &Notification) {
    let color = match notification.kind {
        NotificationKind::Info => Color::Cyan,
        NotificationKind::Success => Color::Green,
        NotificationKind::Warning => Color::Yellow,
        NotificationKind::Error => Color::Red,
    };
    eprintln!("{}", style(&notification.message).with(color).bold());
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let guard = init_tracing()?;
    info!("Citas starting");
    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load config");
            return Err(e);
        }
    };

    let page = Arc::new(Page::new(NotificationArea::with_renderer(render_notification)));
    let storage = config.open_storage()?;
    let mut client = ApiClient::new(storage, page.clone())?;
    page.ready(&client);

    let result = run(cli.command, &mut client, &page, &mut config).await;
    if let Err(ref e) = result {
        page.show_notification(e.to_string(), NotificationKind::Error);
        drop(guard);
        std::process::exit(1);
    }
    result
}

async fn run(command: Command, client: &mut ApiClient, page: &Page, config: &mut Config) -> Result<()> {
    match command {
        Command::Login { email } => {
            let email = match email.or_else(|| config.last_email.clone()) {
                Some(email) => email,
                None => prompt("Email: ")?,
            };
            let password = rpassword::prompt_password("Contraseña: ")?;
            let user = client.login(&email, &password).await?;

            config.last_email = Some(email);
            config.save()?;
            page.show_notification(
                format!("Bienvenido, {}", format_optional(user.name(), "usuario")),
                NotificationKind::Success,
            );
        }
        Command::Register { name, email, phone } => {
            let password = rpassword::prompt_password("Contraseña: ")?;
            let data = Registration {
                nombre: name,
                email: email.clone(),
                password,
                telefono: phone,
            };
            let user = client.register(&data).await?;

            config.last_email = Some(email);
            config.save()?;
            page.show_notification(
                format!("Cuenta creada para {}", format_optional(user.name(), "usuario")),
                NotificationKind::Success,
            );
        }
        Command::Logout => {
            client.logout();
            page.show_notification(
                format!("Sesión cerrada, volviendo a {}", page.location()),
                NotificationKind::Info,
            );
        }
        Command::Whoami => match client.current_user()? {
            Some(user) => {
                println!("{}", format_optional(user.name(), "-"));
                println!("  email:    {}", format_optional(user.email(), "-"));
                if let Some(phone) = user.phone() {
                    println!("  teléfono: {}", format_phone(phone));
                }
                let roles = user.roles();
                if !roles.is_empty() {
                    println!("  roles:    {}", roles.join(", "));
                }
            }
            None => page.show_notification("No has iniciado sesión", NotificationKind::Warning),
        },
        Command::Services { professional } => {
            let services = match professional {
                Some(id) => client.services_by_professional(id).await,
                None => client.list_services().await,
            };
            if services.is_empty() {
                page.show_notification("No hay servicios disponibles", NotificationKind::Info);
            }
            for service in services {
                println!(
                    "{:>4}  {:<24} {:<10} {}",
                    service.id().map(|id| id.to_string()).unwrap_or_default(),
                    format_optional(service.name(), "-"),
                    format_optional(service.duration(), "-"),
                    truncate_string(service.description().unwrap_or_default(), DESCRIPTION_WIDTH),
                );
            }
        }
        Command::Professionals => {
            let professionals = client.list_professionals().await;
            if professionals.is_empty() {
                page.show_notification("No hay profesionales disponibles", NotificationKind::Info);
            }
            for professional in professionals {
                println!(
                    "{:>4}  {:<24} {:<20} {}",
                    professional.id().map(|id| id.to_string()).unwrap_or_default(),
                    format_optional(professional.name(), "-"),
                    format_optional(professional.specialty(), "-"),
                    professional.display_rating(),
                );
            }
        }
        Command::Book {
            service,
            professional,
            at,
            notes,
        } => {
            let user_id = require_user_id(client)?;
            let payload = NewAppointment {
                fecha_hora: parse_appointment_time(&at)?,
                notas: notes,
                usuario_id: user_id,
                servicio_id: service,
                profesional_id: professional,
            };
            let cita = client.create_appointment(&payload).await?;
            print_appointment(&cita);
            page.show_notification("Cita creada", NotificationKind::Success);
        }
        Command::Upcoming => {
            let user_id = require_user_id(client)?;
            let citas = client.upcoming_appointments(user_id).await;
            if citas.is_empty() {
                page.show_notification("No tienes citas próximas", NotificationKind::Info);
            }
            citas.iter().for_each(print_appointment);
        }
        Command::History => {
            let user_id = require_user_id(client)?;
            let citas = client.appointment_history(user_id).await;
            if citas.is_empty() {
                page.show_notification("Aún no tienes citas anteriores", NotificationKind::Info);
            }
            citas.iter().for_each(print_appointment);
        }
        Command::Cancel { id } => {
            require_user_id(client)?;
            client.cancel_appointment(id).await?;
            page.show_notification(format!("Cita #{} cancelada", id), NotificationKind::Success);
        }
    }
    Ok(())
}

fn require_user_id(client: &ApiClient) -> Result<i64> {
    if !client.is_authenticated() {
        anyhow::bail!("Debes iniciar sesión primero");
    }
    client
        .current_user()?
        .and_then(|user| user.user_id())
        .context("El usuario guardado no tiene usuarioId")
}

fn parse_appointment_time(value: &str) -> Result<NaiveDateTime> {
    APPOINTMENT_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .with_context(|| format!("Fecha inválida: {} (usa AAAA-MM-DDTHH:MM)", value))
}

fn print_appointment(cita: &Appointment) {
    let when = cita.scheduled_at().map(format_date).unwrap_or_else(|| "-".to_string());
    let price = cita.final_price().map(format_price).unwrap_or_else(|| "-".to_string());
    println!(
        "#{:<5} {}  {} con {}  [{}]  {}",
        cita.id().map(|id| id.to_string()).unwrap_or_default(),
        when.bold(),
        format_optional(cita.service_name(), "servicio"),
        format_optional(cita.professional_name(), "profesional"),
        format_optional(cita.status(), "-"),
        price,
    );
    if let Some(notes) = cita.notes() {
        println!("       {}", notes.italic());
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
