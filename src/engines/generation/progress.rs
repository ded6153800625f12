use crate::types::GenerationReport;
use std::sync::mpsc::Sender;

/// Per-generation notifications from the evolution loop.
pub trait ProgressCallback: Send {
    fn on_generation_start(&mut self, generation: usize);
    fn on_generation_complete(&mut self, report: &GenerationReport, hall_of_fame_size: usize);
}

pub struct ConsoleProgressCallback;

impl ProgressCallback for ConsoleProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        log::debug!("Generation {} starting...", generation + 1);
    }

    fn on_generation_complete(&mut self, report: &GenerationReport, hof_size: usize) {
        let m = &report.metrics;
        log::info!(
            "Generation {} complete. Best fitness: {:.6}, average: {:.6}, best so far: {:.6}, Hall of Fame size: {}",
            m.generation + 1,
            m.best_fitness,
            m.average_fitness,
            m.best_so_far,
            hof_size
        );
        log::info!("  best: {}", report.best_math);
    }
}

/// Discards every notification
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn on_generation_start(&mut self, _generation: usize) {}

    fn on_generation_complete(&mut self, _report: &GenerationReport, _hof_size: usize) {}
}

#[derive(Debug, Clone)]
pub enum ProgressMessage {
    GenerationStart(usize),
    GenerationComplete { report: GenerationReport, hof_size: usize },
}

/// Forwards notifications to another thread. A closed receiver is ignored.
pub struct ChannelProgressCallback {
    sender: Sender<ProgressMessage>,
}

impl ChannelProgressCallback {
    pub fn new(sender: Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationStart(generation));
    }

    fn on_generation_complete(&mut self, report: &GenerationReport, hof_size: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationComplete {
            report: report.clone(),
            hof_size,
        });
    }
}

impl<C: ProgressCallback + ?Sized> ProgressCallback for &mut C {
    fn on_generation_start(&mut self, generation: usize) {
        (**self).on_generation_start(generation)
    }

    fn on_generation_complete(&mut self, report: &GenerationReport, hof_size: usize) {
        (**self).on_generation_complete(report, hof_size)
    }
}
