use crate::{
    assets,
    config::AppConfig,
    modman::{self, ApiInstaller, InstallRequest, ModInstaller, Verb},
    status::StatusContext,
};
use anyhow::{bail, Context, Result};

#[derive(Debug)]
enum CliAction {
    Help,
    Version,
    Assets(AssetsCommand),
    Mod(ModCommand),
}

#[derive(Debug)]
enum AssetsCommand {
    Ensure,
    Path,
    Clean,
}

#[derive(Debug)]
enum ModCommand {
    Install(ModOptions),
    Uninstall(ModOptions),
    Update(ModOptions),
    List,
    Init,
}

#[derive(Debug, Default)]
struct ModOptions {
    names: Vec<String>,
    dry_run: bool,
    force: bool,
    prune: bool,
}

pub fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match parse_args(&args)? {
        CliAction::Help => {
            print_help();
            Ok(())
        }
        CliAction::Version => {
            println!("Hearthview v{}", crate::APP_VERSION);
            Ok(())
        }
        CliAction::Assets(command) => run_assets_command(command),
        CliAction::Mod(command) => {
            let config = AppConfig::load_or_create()?;
            let installer = ApiInstaller::new(&config.mod_api_endpoint);
            run_mod_command(&installer, command)
        }
    }
}

fn parse_args(args: &[String]) -> Result<CliAction> {
    let Some(first) = args.first() else {
        return Ok(CliAction::Help);
    };
    match first.as_str() {
        "--help" | "-h" | "help" => Ok(CliAction::Help),
        "--version" | "-V" | "version" => Ok(CliAction::Version),
        "assets" => parse_assets_args(&args[1..]),
        "mod" => parse_mod_args(&args[1..]),
        other => bail!("unknown command: {other} (try --help)"),
    }
}

fn parse_assets_args(args: &[String]) -> Result<CliAction> {
    let Some(sub) = args.first() else {
        bail!("assets requires a subcommand: ensure, path, clean");
    };
    if args.len() > 1 {
        bail!("assets {sub} takes no arguments");
    }
    let command = match sub.as_str() {
        "ensure" => AssetsCommand::Ensure,
        "path" => AssetsCommand::Path,
        "clean" => AssetsCommand::Clean,
        other => bail!("unknown assets subcommand: {other}"),
    };
    Ok(CliAction::Assets(command))
}

fn parse_mod_args(args: &[String]) -> Result<CliAction> {
    let Some(sub) = args.first() else {
        bail!("mod requires a subcommand: install, uninstall, update, list, init");
    };
    let rest = &args[1..];
    let command = match sub.as_str() {
        "install" => ModCommand::Install(parse_mod_options(rest)?),
        "uninstall" => ModCommand::Uninstall(parse_mod_options(rest)?),
        "update" => ModCommand::Update(parse_mod_options(rest)?),
        "list" => {
            if !rest.is_empty() {
                bail!("mod list takes no arguments");
            }
            ModCommand::List
        }
        "init" => {
            if !rest.is_empty() {
                bail!("mod init takes no arguments");
            }
            ModCommand::Init
        }
        other => bail!("unknown mod subcommand: {other}"),
    };
    Ok(CliAction::Mod(command))
}

fn parse_mod_options(args: &[String]) -> Result<ModOptions> {
    let mut options = ModOptions::default();
    for arg in args {
        match arg.as_str() {
            "--dry-run" => options.dry_run = true,
            "--force" => options.force = true,
            "--prune" => options.prune = true,
            flag if flag.starts_with('-') => bail!("unknown flag: {flag}"),
            name => options.names.push(name.to_string()),
        }
    }
    if options.force && options.dry_run {
        bail!("--force cannot be used with --dry-run");
    }
    Ok(options)
}

fn run_assets_command(command: AssetsCommand) -> Result<()> {
    let config = AppConfig::load_or_create()?;
    let dest = config.resolve_dashboard_dir()?;
    match command {
        AssetsCommand::Ensure => {
            let ctx = StatusContext::to_console();
            assets::ensure_into(&ctx, &dest)?;
            println!(
                "Dashboard UI v{} ready at {}",
                crate::APP_VERSION,
                dest.display()
            );
            Ok(())
        }
        AssetsCommand::Path => {
            println!("{}", dest.display());
            Ok(())
        }
        AssetsCommand::Clean => {
            let removed = assets::clean(&dest)?;
            println!(
                "Removed {removed} extracted {}",
                modman::pluralize("file", removed)
            );
            Ok(())
        }
    }
}

fn run_mod_command(installer: &dyn ModInstaller, command: ModCommand) -> Result<()> {
    match command {
        ModCommand::Install(options) => {
            let request = InstallRequest {
                names: options.names,
                dry_run: options.dry_run,
                force: options.force,
                prune: options.prune,
            };
            let response = installer.install(&request)?;
            println!(
                "{}",
                modman::build_install_summary(&response, request.dry_run)
            );
            Ok(())
        }
        ModCommand::Uninstall(options) => {
            let response = installer.uninstall(&options.names, options.dry_run)?;
            print_op_result(Verb::Uninstalled, options.dry_run, &response);
            Ok(())
        }
        ModCommand::Update(options) => {
            let response = installer.update(&options.names, options.dry_run)?;
            print_op_result(Verb::Upgraded, options.dry_run, &response);
            Ok(())
        }
        ModCommand::List => {
            let mods = installer.list()?;
            if mods.is_empty() {
                println!("No mods installed");
            }
            for entry in mods {
                println!("{} {}", entry.name, entry.version);
            }
            Ok(())
        }
        ModCommand::Init => {
            let dir = std::env::current_dir().context("resolve working directory")?;
            match modman::init_workspace(&dir)? {
                Some(modfile) => {
                    println!("Created {} for mod {}", modman::MODFILE_NAME, modfile.name)
                }
                None => println!("Working folder already contains a mod definition file"),
            }
            Ok(())
        }
    }
}

fn print_op_result(verb: Verb, dry_run: bool, response: &modman::OpResponse) {
    println!(
        "{} {} {}",
        verb.label(dry_run),
        response.count,
        modman::pluralize("mod", response.count)
    );
    if !response.detail.is_empty() {
        println!("{}", response.detail);
    }
}

fn print_help() {
    println!("Hearthview — local dashboards with community mods");
    println!();
    println!("Usage:");
    println!("  hearthview <command> [arguments]");
    println!();
    println!("Commands:");
    println!("  assets ensure             Install or refresh the bundled dashboard UI");
    println!("  assets path               Print the dashboard UI directory");
    println!("  assets clean              Remove the extracted dashboard UI");
    println!("  mod install [mod...]      Install one or more mods and their dependencies");
    println!("  mod uninstall [mod...]    Uninstall mods");
    println!("  mod update [mod...]       Update mods to the latest allowed versions");
    println!("  mod list                  List currently installed mods");
    println!("  mod init                  Initialize the current directory with a mod.json file");
    println!();
    println!("Flags:");
    println!("  --dry-run                 Show what would change without modifying anything");
    println!("  --force                   Apply even if version requirements are not met");
    println!("  --prune                   Remove unused dependencies afterwards");
    println!("  -h, --help                Show this help");
    println!("  -V, --version             Print the version");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modman::{InstallResponse, ListedMod, OpResponse};
    use std::sync::Mutex;

    #[test]
    fn no_args_means_help() {
        assert!(matches!(parse_args(&[]).unwrap(), CliAction::Help));
    }

    #[test]
    fn parses_assets_subcommands() {
        let args = vec!["assets".to_string(), "ensure".to_string()];
        assert!(matches!(
            parse_args(&args).unwrap(),
            CliAction::Assets(AssetsCommand::Ensure)
        ));
        let args = vec!["assets".to_string(), "clean".to_string()];
        assert!(matches!(
            parse_args(&args).unwrap(),
            CliAction::Assets(AssetsCommand::Clean)
        ));
    }

    #[test]
    fn parses_mod_install_flags_and_names() {
        let args: Vec<String> = ["mod", "install", "aws-insights", "--dry-run", "--prune"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        match parse_args(&args).unwrap() {
            CliAction::Mod(ModCommand::Install(options)) => {
                assert_eq!(options.names, vec!["aws-insights"]);
                assert!(options.dry_run);
                assert!(options.prune);
                assert!(!options.force);
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn rejects_force_with_dry_run() {
        let args: Vec<String> = ["mod", "install", "--force", "--dry-run"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(parse_args(&args).is_err());
    }

    #[test]
    fn rejects_unknown_flags_and_commands() {
        let args = vec!["frobnicate".to_string()];
        assert!(parse_args(&args).is_err());
        let args: Vec<String> = ["mod", "install", "--what"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(parse_args(&args).is_err());
    }

    struct FakeInstaller {
        requests: Mutex<Vec<InstallRequest>>,
    }

    impl ModInstaller for FakeInstaller {
        fn install(&self, request: &InstallRequest) -> Result<InstallResponse> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(InstallResponse {
                installed_count: request.names.len(),
                installed_tree: "local\n└── stub@0.1".to_string(),
            })
        }

        fn uninstall(&self, names: &[String], _dry_run: bool) -> Result<OpResponse> {
            Ok(OpResponse {
                count: names.len(),
                detail: String::new(),
            })
        }

        fn update(&self, _names: &[String], _dry_run: bool) -> Result<OpResponse> {
            Ok(OpResponse {
                count: 0,
                detail: String::new(),
            })
        }

        fn list(&self) -> Result<Vec<ListedMod>> {
            Ok(vec![ListedMod {
                name: "stub".to_string(),
                version: "0.1.0".to_string(),
            }])
        }
    }

    #[test]
    fn mod_commands_flow_through_the_installer_contract() {
        let installer = FakeInstaller {
            requests: Mutex::new(Vec::new()),
        };
        let options = ModOptions {
            names: vec!["stub".to_string()],
            dry_run: true,
            force: false,
            prune: true,
        };
        run_mod_command(&installer, ModCommand::Install(options)).unwrap();
        run_mod_command(&installer, ModCommand::List).unwrap();

        let requests = installer.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].names, vec!["stub"]);
        assert!(requests[0].dry_run);
        assert!(requests[0].prune);
    }
}
