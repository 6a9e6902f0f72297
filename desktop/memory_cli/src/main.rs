/*
 *  Copyright (C) 2025  Markus Elias Gerber
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::{env, error::Error, fmt, fs, path::Path, process, str::FromStr};

use env_logger::{Builder, Env};
use log::info;
use paged_memory::{
    modules::persistent_storage::FilePersistentStorageModule, MemoryConfig, MemoryManager,
    ProcessId,
};
use serde::Serialize;

const CONFIG_FILE: &str = "config.json";

const USAGE: &str = "usage: memory_cli <store-dir> <command>

commands:
    init [config.json]              create a new store where every frame is free
    allocate <pid> <payload-file>   place the lines of a file in memory
    free <pid>                      release all memory of a process
    swap <segment> <page> <pid>     bring a page into the primary tier
    status [pid]                    print free capacity (and usage of a process)
    show <pid>                      print the page table of a process";

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Serialize)]
struct ProcessUsage {
    process_id: ProcessId,
    available_primary_capacity: usize,
    used_by: usize,
}

fn main() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_module_path(false)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(err) = run(&args) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}

fn run(args: &[String]) -> CliResult<()> {
    let (directory, command, rest) = match args {
        [directory, command, rest @ ..] => (Path::new(directory), command.as_str(), rest),
        _ => return Err(USAGE.into()),
    };

    if command == "init" {
        return init(directory, rest.first().map(String::as_str));
    }

    let manager = open(directory)?;
    match (command, rest) {
        ("allocate", [pid, file]) => {
            let payload = fs::read_to_string(file)?;
            let summary = manager.allocate(parse(pid)?, &payload)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        ("free", [pid]) => {
            let summary = manager.release(parse(pid)?)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        ("swap", [segment, page, pid]) => {
            let outcome = manager.swap_in(parse(segment)?, parse(page)?, parse(pid)?)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        ("status", []) => {
            println!("{}", serde_json::to_string_pretty(&manager.status()?)?);
        }
        ("status", [pid]) => {
            let process_id: ProcessId = parse(pid)?;
            let usage = ProcessUsage {
                process_id,
                available_primary_capacity: manager.available_primary_capacity()?,
                used_by: manager.used_by(process_id)?,
            };
            println!("{}", serde_json::to_string_pretty(&usage)?);
        }
        ("show", [pid]) => {
            let process = manager.process(parse(pid)?)?;
            println!("{}", serde_json::to_string_pretty(&process)?);
        }
        _ => return Err(USAGE.into()),
    }

    Ok(())
}

fn init(directory: &Path, config_file: Option<&str>) -> CliResult<()> {
    let config = match config_file {
        Some(path) => MemoryConfig::from_json_file(path)?,
        None => MemoryConfig::default(),
    };

    let storage = FilePersistentStorageModule::create(directory, &config)?;
    fs::write(
        directory.join(CONFIG_FILE),
        serde_json::to_string_pretty(&config)?,
    )?;

    let manager: MemoryManager<_> = MemoryManager::new(storage, config)?;
    info!(
        "Created store in {} ({} bytes of primary capacity)",
        directory.display(),
        manager.available_primary_capacity()?
    );
    Ok(())
}

fn open(directory: &Path) -> CliResult<MemoryManager<FilePersistentStorageModule>> {
    let config_path = directory.join(CONFIG_FILE);
    let config = if config_path.is_file() {
        MemoryConfig::from_json_file(config_path)?
    } else {
        MemoryConfig::default()
    };

    let storage = FilePersistentStorageModule::open(directory)?;
    Ok(MemoryManager::new(storage, config)?)
}

fn parse<T: FromStr>(value: &str) -> CliResult<T>
where
    T::Err: fmt::Display,
{
    value
        .parse()
        .map_err(|err| format!("invalid number {:?}: {}", value, err).into())
}

#[cfg(test)]
mod test {
    use std::{env::temp_dir, fs};

    use super::{run, ProcessUsage};

    #[test]
    fn test_process_usage_is_json() {
        let usage = ProcessUsage {
            process_id: 3,
            available_primary_capacity: 8192,
            used_by: 4096,
        };

        assert_eq!(
            serde_json::to_value(&usage).unwrap(),
            serde_json::json!({
                "process_id": 3,
                "available_primary_capacity": 8192,
                "used_by": 4096
            })
        );
    }

    #[test]
    fn test_commands() {
        let directory = temp_dir().join("memory_cli_test_commands");
        let _ = fs::remove_dir_all(&directory);
        let payload = temp_dir().join("memory_cli_test_commands.txt");
        fs::write(&payload, "first\nsecond\nthird\n").unwrap();

        let store = directory.display().to_string();
        let payload = payload.display().to_string();
        let run_with = |args: &[&str]| {
            let args: Vec<String> = [store.as_str()]
                .iter()
                .chain(args)
                .map(|arg| arg.to_string())
                .collect();
            run(&args)
        };

        run_with(&["init"]).unwrap();
        run_with(&["allocate", "7", &payload]).unwrap();
        run_with(&["swap", "3", "1", "7"]).unwrap();
        run_with(&["status"]).unwrap();
        run_with(&["status", "7"]).unwrap();
        run_with(&["show", "7"]).unwrap();
        run_with(&["free", "7"]).unwrap();

        assert!(run_with(&["show", "7"]).is_err());
        assert!(run_with(&["status", "seven"]).is_err());
        assert!(run_with(&["unknown"]).is_err());

        let _ = fs::remove_dir_all(&directory);
    }
}
