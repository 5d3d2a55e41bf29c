//! Interface de terminal do capgen — barra de progresso e saída colorida.
//!
//! Usa as crates `indicatif` para a barra de progresso e `console` para
//! estilização com cores. O [`PoolProgress`] observa o pool de tarefas
//! e mostra cada modelo gerado (ou com falha) no terminal.

use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::pool::{PoolEvents, PoolReport, TerminationSignal};

/// Indicador visual de progresso para uma execução do driver.
///
/// Exibe uma barra com `concluídos/total` e a tarefa iniciada mais
/// recentemente, além de mensagens coloridas para sucesso (verde) e
/// falha (vermelho).
pub struct PoolProgress {
    // Barra de progresso do indicatif.
    pb: ProgressBar,
    // Estilo verde para mensagens de sucesso.
    green: Style,
    // Estilo vermelho para mensagens de falha.
    red: Style,
    // Estilo esmaecido para detalhes secundários.
    dim: Style,
}

impl Default for PoolProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolProgress {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            dim: Style::new().dim(),
        }
    }

    /// Finaliza a barra e exibe o resumo com as tarefas que falharam.
    pub fn finish(&self, report: &PoolReport) {
        self.pb.finish_and_clear();

        if report.is_empty() {
            println!("  Nothing to generate: no profiles selected");
            return;
        }

        let failures = report.failures();
        if failures.is_empty() {
            println!(
                "  {} {} models generated",
                self.green.apply_to("✓"),
                report.completed()
            );
            return;
        }

        println!(
            "  {} {} of {} models failed",
            self.red.apply_to("✗"),
            failures.len(),
            report.len()
        );
        for (name, reason) in failures {
            println!("    {} {}", self.red.apply_to(name), self.dim.apply_to(reason));
        }
    }
}

impl PoolEvents for PoolProgress {
    fn pool_started(&self, total: usize, limit: usize) {
        self.pb.set_length(total as u64);
        self.pb.println(format!(
            "  Generating {total} models with up to {limit} workers"
        ));
    }

    fn task_started(&self, name: &str) {
        self.pb.set_message(name.to_string());
    }

    /// Sucesso é mostrado em verde com checkmark; falha em vermelho com X.
    fn task_finished(&self, name: &str, signal: &TerminationSignal) {
        self.pb.inc(1);
        match signal {
            TerminationSignal::Completed => {
                self.pb
                    .println(format!("  {} {name}", self.green.apply_to("✓")));
            }
            TerminationSignal::Failed(reason) => {
                self.pb.println(format!(
                    "  {} {name}: {}",
                    self.red.apply_to("✗"),
                    self.dim.apply_to(reason)
                ));
            }
        }
    }
}
