#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgGroup;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::app::AppContext;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Attachment;
use crate::domain::models::ClientError;
use crate::domain::models::LoginRequest;
use crate::domain::models::Navigation;
use crate::domain::models::NewTodo;
use crate::domain::models::RegisterRequest;
use crate::domain::models::StorageName;
use crate::domain::models::Todo;
use crate::domain::models::TodoChanges;
use crate::domain::services::GUEST_LIMIT;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

/// Turns a store failure into something a person can act on.
pub fn describe_error(err: ClientError) -> anyhow::Error {
    if err.guest_limit_reached() {
        return anyhow!(
            "{err}\nGuests can create up to {GUEST_LIMIT} todos. Run `todo-sync auth register` or `todo-sync auth login` to keep going."
        );
    }

    if let ClientError::NotFound { id } = err {
        return anyhow!("Todo {id} is not in your list");
    }

    return anyhow!(err);
}

fn mime_for(file_path: &path::Path) -> String {
    let ext = file_path
        .extension()
        .map(|ext| return ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    };

    return mime.to_string();
}

#[allow(clippy::implicit_return)]
async fn read_attachment(file_path: &str) -> Result<Attachment> {
    let file_path = path::PathBuf::from(file_path);
    let bytes = fs::read(&file_path).await?;
    let file_name = file_path
        .file_name()
        .map(|name| return name.to_string_lossy().to_string())
        .unwrap_or_else(|| return "upload".to_string());

    return Ok(Attachment {
        file_name,
        mime: mime_for(&file_path),
        bytes,
    });
}

fn format_list(todos: &[Todo]) -> String {
    if todos.is_empty() {
        return "There are no todos yet. Create your first one!".to_string();
    }

    return todos
        .iter()
        .map(|todo| return todo.format())
        .collect::<Vec<String>>()
        .join("\n");
}

fn format_guest_usage(app: &AppContext) -> String {
    return format!(
        "Guest: {count}/{limit} todos used, {remaining} remaining",
        count = app.session.guest_todo_count(),
        limit = app.session.guest_limit(),
        remaining = app.session.guest_remaining(),
    );
}

fn todo_id(matches: &ArgMatches) -> Result<i64> {
    return matches
        .get_one::<i64>("id")
        .copied()
        .ok_or_else(|| return anyhow!("A todo id is required"));
}

fn string_arg(matches: &ArgMatches, id: &str) -> Option<String> {
    return matches.get_one::<String>(id).map(|val| return val.to_string());
}

#[allow(clippy::implicit_return)]
async fn run_todos(app: &AppContext, matches: &ArgMatches) -> Result<String> {
    match matches.subcommand() {
        Some(("list", sub)) => {
            let (res, _) = futures::join!(
                app.todos.fetch_todos(),
                app.session.fetch_guest_todo_count()
            );
            res.map_err(describe_error)?;

            let todos = if sub.get_flag("completed") {
                app.todos.completed_todos()
            } else if sub.get_flag("pending") {
                app.todos.pending_todos()
            } else {
                app.todos.all_todos()
            };

            let mut lines = vec![
                format_list(&todos),
                format!(
                    "{total} todos, {completed} completed, {pending} pending",
                    total = app.todos.todo_count(),
                    completed = app.todos.completed_count(),
                    pending = app.todos.pending_count(),
                ),
            ];
            if !app.session.is_authenticated() {
                lines.push(format_guest_usage(app));
            }

            return Ok(lines.join("\n"));
        }
        Some(("get", sub)) => {
            let todo = app
                .todos
                .fetch_todo_by_id(todo_id(sub)?)
                .await
                .map_err(describe_error)?;
            return Ok(todo.format());
        }
        Some(("create", sub)) => {
            let mut todo = NewTodo::new(
                &string_arg(sub, "name").unwrap_or_default(),
                &string_arg(sub, "description").unwrap_or_default(),
            );
            if let Some(image) = string_arg(sub, "image") {
                todo.image = Some(read_attachment(&image).await?);
            }

            let guest = !app.session.is_authenticated();
            if guest {
                app.session.fetch_guest_todo_count().await;
            }

            let created = app.todos.create_todo(todo).await.map_err(describe_error)?;
            let mut lines = vec![format!("Created {}", created.format())];
            if guest {
                lines.push(format_guest_usage(app));
            }

            return Ok(lines.join("\n"));
        }
        Some(("update", sub)) => {
            let changes = TodoChanges {
                name: string_arg(sub, "name"),
                description: string_arg(sub, "description"),
                completed: sub.get_one::<bool>("completed").copied(),
            };
            if changes.is_empty() {
                bail!("Nothing to update. Pass at least one of --name, --description or --completed");
            }

            let todo = app
                .todos
                .update_todo(todo_id(sub)?, changes)
                .await
                .map_err(describe_error)?;
            return Ok(format!("Updated {}", todo.format()));
        }
        Some(("delete", sub)) => {
            let id = todo_id(sub)?;
            app.todos.delete_todo(id).await.map_err(describe_error)?;
            return Ok(format!("Deleted todo {id}"));
        }
        Some(("toggle", sub)) => {
            let id = todo_id(sub)?;
            app.todos.fetch_todos().await.map_err(describe_error)?;
            let todo = app
                .todos
                .toggle_todo_complete(id)
                .await
                .map_err(describe_error)?;
            return Ok(format!("Updated {}", todo.format()));
        }
        _ => bail!("Unknown todos command"),
    }
}

#[allow(clippy::implicit_return)]
async fn run_auth(app: &AppContext, matches: &ArgMatches) -> Result<String> {
    match matches.subcommand() {
        Some(("login", sub)) => {
            let message = app
                .session
                .login(LoginRequest {
                    username_or_email: string_arg(sub, "username-or-email").unwrap_or_default(),
                    password: string_arg(sub, "password").unwrap_or_default(),
                })
                .await
                .map_err(describe_error)?;
            return Ok(auth_result(app, &message));
        }
        Some(("register", sub)) => {
            let message = app
                .session
                .register(RegisterRequest {
                    username: string_arg(sub, "username").unwrap_or_default(),
                    email: string_arg(sub, "email").unwrap_or_default(),
                    password: string_arg(sub, "password").unwrap_or_default(),
                })
                .await
                .map_err(describe_error)?;
            return Ok(auth_result(app, &message));
        }
        Some(("logout", _)) => {
            app.session.logout();
            return Ok("Logged out".to_string());
        }
        Some(("status", _)) => {
            if let Some(user) = app.session.current_user() {
                if app.session.is_authenticated() {
                    return Ok(format!("Logged in as {}", user.display_name()));
                }
            }

            app.session.fetch_guest_todo_count().await;
            return Ok(format!("Not logged in\n{}", format_guest_usage(app)));
        }
        _ => bail!("Unknown auth command"),
    }
}

fn auth_result(app: &AppContext, message: &str) -> String {
    let name = app
        .session
        .current_user()
        .map(|user| return user.display_name())
        .unwrap_or_default();

    if message.is_empty() {
        return format!("Logged in as {name}");
    }

    return format!("{message}\nLogged in as {name}");
}

fn run_route(app: &AppContext, matches: &ArgMatches) -> Result<String> {
    let target = string_arg(matches, "path").unwrap_or_default();

    match app.router.navigate(&target, &app.session) {
        Some(Navigation::Proceed(found)) => {
            let mut res = format!("{} {}", found.route.name, found.path);
            if let Some(id) = found.id {
                res = format!("{res} (id: {id})");
            }
            return Ok(res);
        }
        Some(Navigation::Redirect(to)) => return Ok(format!("Redirect to {to}")),
        None => bail!(format!("No page matches {target}")),
    }
}

/// Runs a store backed command and returns what should be shown to the user.
#[allow(clippy::implicit_return)]
pub async fn run(app: &AppContext, matches: &ArgMatches) -> Result<String> {
    match matches.subcommand() {
        Some(("todos", sub)) => return run_todos(app, sub).await,
        Some(("auth", sub)) => return run_auth(app, sub).await,
        Some(("guest", _)) => {
            app.session.fetch_guest_todo_count().await;
            return Ok(format_guest_usage(app));
        }
        Some(("route", sub)) => return run_route(app, sub),
        _ => bail!("Unknown command"),
    }
}

#[allow(clippy::implicit_return)]
async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::get(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(config_file_path.clone()).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn arg_id() -> Arg {
    return Arg::new("id")
        .help("Todo ID")
        .value_parser(value_parser!(i64))
        .required(true);
}

fn arg_password() -> Arg {
    return Arg::new("password")
        .short('p')
        .long("password")
        .env("TODOSYNC_PASSWORD")
        .num_args(1)
        .help("Account password.")
        .required(true);
}

fn subcommand_todos() -> Command {
    return Command::new("todos")
        .about("List and change todos.")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("list")
                .about("List all todos.")
                .arg(
                    Arg::new("completed")
                        .long("completed")
                        .help("Only show completed todos.")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("pending")
                        .long("pending")
                        .help("Only show pending todos.")
                        .action(ArgAction::SetTrue),
                )
                .group(ArgGroup::new("filter").args(["completed", "pending"])),
        )
        .subcommand(Command::new("get").about("Show a single todo.").arg(arg_id()))
        .subcommand(
            Command::new("create")
                .about("Create a todo. Guests can create up to 3.")
                .arg(
                    Arg::new("name")
                        .short('n')
                        .long("name")
                        .help("Todo name.")
                        .required(true),
                )
                .arg(
                    Arg::new("description")
                        .short('d')
                        .long("description")
                        .help("Todo description."),
                )
                .arg(
                    Arg::new("image")
                        .short('i')
                        .long("image")
                        .help("Path to an image to attach."),
                ),
        )
        .subcommand(
            Command::new("update")
                .about("Change fields of a todo.")
                .arg(arg_id())
                .arg(Arg::new("name").short('n').long("name").help("New name."))
                .arg(
                    Arg::new("description")
                        .short('d')
                        .long("description")
                        .help("New description."),
                )
                .arg(
                    Arg::new("completed")
                        .long("completed")
                        .help("Mark as completed or not.")
                        .value_parser(value_parser!(bool)),
                ),
        )
        .subcommand(Command::new("delete").about("Delete a todo.").arg(arg_id()))
        .subcommand(
            Command::new("toggle")
                .about("Flip the completed state of a todo in your list.")
                .arg(arg_id()),
        );
}

fn subcommand_auth() -> Command {
    return Command::new("auth")
        .about("Log in, register or log out.")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("login")
                .about("Log in with a username or email.")
                .arg(
                    Arg::new("username-or-email")
                        .help("Username or email.")
                        .required(true),
                )
                .arg(arg_password()),
        )
        .subcommand(
            Command::new("register")
                .about("Create an account and log in.")
                .arg(Arg::new("username").help("Username.").required(true))
                .arg(Arg::new("email").help("Email.").required(true))
                .arg(arg_password()),
        )
        .subcommand(Command::new("logout").about("Forget the stored session."))
        .subcommand(Command::new("status").about("Show who is logged in."));
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

pub fn build() -> Command {
    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_GIT_DESCRIBE").unwrap_or("unknown")
    );

    return Command::new("todo-sync")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .arg_required_else_help(true)
        .subcommand(subcommand_todos())
        .subcommand(subcommand_auth())
        .subcommand(Command::new("guest").about("Show how many todos a guest has left."))
        .subcommand(
            Command::new("route")
                .about("Show where a page path leads for the current session.")
                .arg(Arg::new("path").help("Page path, e.g. /todo/3").required(true)),
        )
        .subcommand(subcommand_config())
        .subcommand(subcommand_completions())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("TODOSYNC_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::ApiUrl.to_string())
                .long(ConfigKey::ApiUrl.to_string())
                .env("TODOSYNC_API_URL")
                .num_args(1)
                .help(format!("Base URL of the to-do service. [default: {}]", Config::default(ConfigKey::ApiUrl)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Storage.to_string())
                .long(ConfigKey::Storage.to_string())
                .env("TODOSYNC_STORAGE")
                .num_args(1)
                .help(format!("Where the session token and user are kept between runs. [default: {}]", Config::default(ConfigKey::Storage)))
                .value_parser(PossibleValuesParser::new(StorageName::VARIANTS))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::StorageDir.to_string())
                .long(ConfigKey::StorageDir.to_string())
                .env("TODOSYNC_STORAGE_DIR")
                .num_args(1)
                .help("Directory used by the file storage. Defaults to the platform cache directory.")
                .global(true),
        );
}

#[allow(clippy::implicit_return)]
pub async fn parse() -> Result<()> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            match subcmd_matches.subcommand() {
                Some(("create", _)) => {
                    create_config_file().await?;
                }
                Some(("default", _)) => {
                    println!("{}", Config::serialize_default(build()));
                }
                Some(("path", _)) => {
                    println!("{}", Config::default(ConfigKey::ConfigFile));
                }
                _ => {
                    subcommand_config().print_long_help()?;
                }
            }
        }
        Some((_, subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            let app = AppContext::from_config()?;
            let res = run(&app, &matches).await?;
            println!("{res}");
        }
        None => {
            build().print_long_help()?;
        }
    }

    return Ok(());
}
