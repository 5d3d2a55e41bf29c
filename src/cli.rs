//! Interface de linha de comando do capgen baseada em clap.
//!
//! Sem subcomando, o binário roda como driver e gera o catálogo inteiro.
//! O subcomando oculto `worker` é usado pelo próprio driver para executar
//! um único job em um processo isolado.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::catalog::Job;

/// capgen — gerador de modelos de keycaps com um processo por modelo.
#[derive(Debug, Parser)]
#[command(name = "capgen", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Arquivo de configuração (padrão: ./capgen.toml, se existir).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Máximo de workers simultâneos (sobrepõe `max_concurrent`).
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Gera um único modelo a partir de um descritor JSON (uso interno).
    #[command(hide = true)]
    Worker {
        /// Descritor do job, ex.: {"profile":"mt3","u":1.25,"row":3}
        job: Job,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{self, Profile};
    use clap::CommandFactory;

    #[test]
    fn cli_without_subcommand_is_driver() {
        let cli = Cli::parse_from(["capgen"]);
        assert!(cli.command.is_none());
        assert!(cli.jobs.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn cli_parses_driver_flags() {
        let cli = Cli::parse_from(["capgen", "-j", "3", "--config", "gen.toml", "--verbose"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.jobs, Some(3));
        assert_eq!(cli.config, Some(PathBuf::from("gen.toml")));
        assert!(cli.verbose);
    }

    #[test]
    fn cli_parses_worker_descriptor() {
        let descriptor = Job::sculpted(Profile::Sa, 1.25, 4).to_descriptor().unwrap();
        let cli = Cli::parse_from(["capgen", "--config", "gen.toml", "worker", descriptor.as_str()]);
        match cli.command {
            Some(Command::Worker { job }) => {
                assert_eq!(job, Job::sculpted(Profile::Sa, 1.25, 4));
            }
            None => panic!("expected Worker command"),
        }
        assert_eq!(cli.config, Some(PathBuf::from("gen.toml")));
    }

    #[test]
    fn cli_classifies_every_catalog_job_as_worker() {
        for expected in catalog::enumerate(&Profile::ALL) {
            let descriptor = expected.to_descriptor().unwrap();
            let cli = Cli::try_parse_from(["capgen", "worker", descriptor.as_str()])
                .unwrap_or_else(|e| panic!("{descriptor} rejected: {e}"));
            match cli.command {
                Some(Command::Worker { job }) => assert_eq!(job, expected),
                None => panic!("{descriptor} parsed as driver mode"),
            }
        }
    }

    #[test]
    fn cli_rejects_malformed_descriptor() {
        assert!(Cli::try_parse_from(["capgen", "worker", "{\"profile\":\"dsa\"}"]).is_err());
        assert!(Cli::try_parse_from(["capgen", "worker"]).is_err());
        assert!(Cli::try_parse_from(["capgen", "worker", "{}", "extra"]).is_err());
        assert!(Cli::try_parse_from(["capgen", "{\"profile\":\"dsa\",\"u\":1}"]).is_err());
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
