//! Loop de monitoramento – leitura → formatação → escrita → espera.
//!
//! Um ciclo por vez: as leituras de CPU e GPU rodam em paralelo em threads
//! de bloqueio e são unidas antes da formatação. O cancelamento é
//! cooperativo, verificado no topo de cada ciclo e durante a espera. Um
//! ciclo já iniciado sempre termina (leituras e escrita) antes do loop
//! sair, então o provedor nunca é fechado com uma leitura em andamento.
//!
//! Falhas dentro de um ciclo nunca encerram o loop: são logadas e seguidas
//! de [`ERROR_BACKOFF`].

use crate::provider::{HardwareProvider, ProviderError};
use crate::reader::SensorReader;
use crate::transport::{Transport, TransportError};
use std::time::Duration;
use thermo_core::{HardwareCategory, MonitorConfig, line_from_readings};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info};

/// Espera após uma falha de ciclo.
pub const ERROR_BACKOFF: Duration = Duration::from_millis(1000);

/// Estado do loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Criado, ainda não iniciado
    Idle,
    Running,
    /// Loop encerrado, recursos ainda abertos
    Stopping,
    /// Transporte e provedor liberados
    Stopped,
}

/// Contadores acumulados do loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    /// Ciclos concluídos
    pub cycles: u64,
    /// Linhas formatadas e entregues ao transporte
    pub lines_sent: u64,
    /// Ciclos sem linha por leitura ausente
    pub skipped: u64,
    pub faults: u64,
}

/// Falha transitória de um ciclo.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("Erro no provedor de sensores: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Tarefa de leitura falhou: {0}")]
    Join(#[from] JoinError),
}

/// Resultado de um ciclo bem-sucedido.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Linha emitida (inclui o `\n`)
    Emitted(String),
    /// Alguma leitura ausente; nada foi escrito
    Skipped { cpu_present: bool, gpu_present: bool },
}

/// Monitor de temperaturas dono do transporte e do leitor.
pub struct Monitor<P: HardwareProvider, T: Transport> {
    reader: SensorReader<P>,
    transport: T,
    poll_interval: Duration,
    state: MonitorState,
    stats: MonitorStats,
    closed: bool,
}

impl<P: HardwareProvider, T: Transport> Monitor<P, T> {
    pub fn new(reader: SensorReader<P>, transport: T, config: &MonitorConfig) -> Self {
        Self {
            reader,
            transport,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            state: MonitorState::Idle,
            stats: MonitorStats::default(),
            closed: false,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    /// Executa um ciclo: lê CPU e GPU em paralelo, formata e escreve.
    pub async fn poll_cycle(&mut self) -> Result<CycleOutcome, CycleError> {
        let cpu_reader = self.reader.clone();
        let gpu_reader = self.reader.clone();

        let (cpu, gpu) = tokio::join!(
            tokio::task::spawn_blocking(move || cpu_reader.read_temperature(HardwareCategory::Cpu)),
            tokio::task::spawn_blocking(move || gpu_reader.read_temperature(HardwareCategory::Gpu)),
        );
        let cpu = cpu??;
        let gpu = gpu??;

        let Some(line) = line_from_readings(cpu.as_ref(), gpu.as_ref()) else {
            debug!(
                "Leitura incompleta (CPU: {}, GPU: {}), nada enviado",
                cpu.is_some(),
                gpu.is_some()
            );
            self.stats.skipped += 1;
            return Ok(CycleOutcome::Skipped {
                cpu_present: cpu.is_some(),
                gpu_present: gpu.is_some(),
            });
        };

        self.transport.write_line(&line)?;
        if self.transport.is_open() {
            info!("Enviado: {}", line.trim_end());
        } else {
            info!("Leitura (sem display): {}", line.trim_end());
        }

        self.stats.lines_sent += 1;
        Ok(CycleOutcome::Emitted(line))
    }

    /// Roda até o cancelamento. Nunca sai por erro de dados.
    pub async fn run(&mut self, cancel: CancellationToken) -> MonitorStats {
        self.state = MonitorState::Running;
        info!(
            "Monitoramento iniciado (intervalo {} ms)",
            self.poll_interval.as_millis()
        );

        while !cancel.is_cancelled() {
            // Ciclo não cancelável: as leituras ocupam o provedor até o fim
            let result = self.poll_cycle().await;
            self.stats.cycles += 1;

            let wait = match result {
                Ok(_) => self.poll_interval,
                Err(e) => {
                    self.stats.faults += 1;
                    error!("Erro ao monitorar temperaturas: {e}");
                    ERROR_BACKOFF
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }

        self.state = MonitorState::Stopping;
        info!(
            "Monitoramento cancelado após {} ciclos ({} linhas, {} falhas)",
            self.stats.cycles, self.stats.lines_sent, self.stats.faults
        );
        self.stats
    }

    /// Libera transporte e provedor, nessa ordem, uma única vez.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.transport.close();
        self.reader.provider().close();
        self.state = MonitorState::Stopped;
        debug!("Recursos do monitor liberados");
    }
}

impl<P: HardwareProvider, T: Transport> Drop for Monitor<P, T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ──────────────────────────────────────────────
// Handle de execução em background
// ──────────────────────────────────────────────

/// Monitor rodando como task. `stop` cancela, aguarda e libera os recursos.
///
/// Descartar o handle sem `stop` também cancela o loop; o monitor libera
/// os recursos no `Drop` quando a task termina.
pub struct MonitorHandle<P: HardwareProvider, T: Transport + 'static> {
    cancel: DropGuard,
    task: JoinHandle<Monitor<P, T>>,
}

impl<P: HardwareProvider, T: Transport + 'static> MonitorHandle<P, T> {
    pub fn spawn(mut monitor: Monitor<P, T>) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            monitor.run(token).await;
            monitor
        });
        Self {
            cancel: cancel.drop_guard(),
            task,
        }
    }

    /// Cancela o loop, espera o ciclo atual terminar e libera os recursos.
    pub async fn stop(self) -> Result<MonitorStats, JoinError> {
        let Self { cancel, task } = self;
        drop(cancel);
        let mut monitor = task.await?;
        monitor.shutdown();
        debug!("Estado final do monitor: {:?}", monitor.state());
        Ok(monitor.stats())
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::DeviceKind;
    use crate::provider::fake::FakeProvider;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use tokio::time::Instant;

    #[derive(Default)]
    struct Recorded {
        open: bool,
        lines: Vec<String>,
        closes: usize,
        fail_next_write: bool,
    }

    /// Transporte em memória; clones compartilham o mesmo registro.
    #[derive(Clone, Default)]
    struct RecordingTransport(Arc<Mutex<Recorded>>);

    impl RecordingTransport {
        fn open() -> Self {
            let t = Self::default();
            t.0.lock().open = true;
            t
        }

        fn never_opened() -> Self {
            Self::default()
        }

        fn lines(&self) -> Vec<String> {
            self.0.lock().lines.clone()
        }

        fn closes(&self) -> usize {
            self.0.lock().closes
        }
    }

    impl Transport for RecordingTransport {
        fn is_open(&self) -> bool {
            self.0.lock().open
        }

        fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
            let mut rec = self.0.lock();
            if !rec.open {
                return Ok(());
            }
            if std::mem::take(&mut rec.fail_next_write) {
                return Err(TransportError::Write(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "cabo desconectado",
                )));
            }
            rec.lines.push(line.to_string());
            Ok(())
        }

        fn close(&mut self) {
            let mut rec = self.0.lock();
            rec.open = false;
            rec.closes += 1;
        }
    }

    fn monitor(
        provider: &Arc<FakeProvider>,
        transport: &RecordingTransport,
    ) -> Monitor<FakeProvider, RecordingTransport> {
        let config = MonitorConfig::default();
        let reader = SensorReader::new(Arc::clone(provider), &config);
        Monitor::new(reader, transport.clone(), &config)
    }

    /// Espera (em tempo virtual) até a condição valer.
    async fn wait_until(mut cond: impl FnMut() -> bool) {
        for _ in 0..10_000 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condição não satisfeita");
    }

    #[tokio::test]
    async fn emits_one_decimal_line() {
        let provider = Arc::new(FakeProvider::cpu_and_gpu(72.46, 65.34));
        let transport = RecordingTransport::open();
        let mut m = monitor(&provider, &transport);

        let outcome = m.poll_cycle().await.unwrap();
        assert_eq!(outcome, CycleOutcome::Emitted("CPU:72.5,GPU:65.3\n".into()));
        assert_eq!(transport.lines(), ["CPU:72.5,GPU:65.3\n"]);
        assert_eq!(m.stats().lines_sent, 1);
    }

    #[tokio::test]
    async fn absent_reading_skips_write() {
        let provider = Arc::new(FakeProvider::cpu_and_gpu(50.0, 40.0));
        provider.set_value(DeviceKind::GpuNvidia, None);
        let transport = RecordingTransport::open();
        let mut m = monitor(&provider, &transport);

        let outcome = m.poll_cycle().await.unwrap();
        assert_eq!(
            outcome,
            CycleOutcome::Skipped {
                cpu_present: true,
                gpu_present: false
            }
        );
        assert!(transport.lines().is_empty());
        assert_eq!(m.stats().skipped, 1);
    }

    #[tokio::test]
    async fn closed_transport_still_emits() {
        let provider = Arc::new(FakeProvider::cpu_and_gpu(55.0, 45.0));
        let transport = RecordingTransport::never_opened();
        let mut m = monitor(&provider, &transport);

        for _ in 0..3 {
            let outcome = m.poll_cycle().await.unwrap();
            assert_eq!(outcome, CycleOutcome::Emitted("CPU:55.0,GPU:45.0\n".into()));
        }
        assert!(transport.lines().is_empty());
        assert_eq!(m.stats().lines_sent, 3);
    }

    #[tokio::test]
    async fn write_failure_is_cycle_error() {
        let provider = Arc::new(FakeProvider::cpu_and_gpu(55.0, 45.0));
        let transport = RecordingTransport::open();
        transport.0.lock().fail_next_write = true;
        let mut m = monitor(&provider, &transport);

        assert!(matches!(m.poll_cycle().await, Err(CycleError::Transport(_))));
        assert!(m.poll_cycle().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn fault_backs_off_then_continues() {
        let provider = Arc::new(FakeProvider::cpu_and_gpu(60.0, 50.0));
        provider.fail_next_refresh("sensor travado");
        let transport = RecordingTransport::open();
        let handle = MonitorHandle::spawn(monitor(&provider, &transport));

        let start = Instant::now();
        wait_until(|| !transport.lines().is_empty()).await;
        let elapsed = start.elapsed();

        // Intervalo padrão é 10 s: a segunda tentativa veio do backoff
        assert!(elapsed >= ERROR_BACKOFF, "elapsed = {elapsed:?}");
        assert!(elapsed < Duration::from_secs(10), "elapsed = {elapsed:?}");

        let stats = handle.stop().await.unwrap();
        assert_eq!(stats.faults, 1);
        assert_eq!(stats.lines_sent, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_sleep_stops_and_closes_once() {
        let provider = Arc::new(FakeProvider::cpu_and_gpu(60.0, 50.0));
        let transport = RecordingTransport::open();
        let handle = MonitorHandle::spawn(monitor(&provider, &transport));

        wait_until(|| transport.lines().len() == 1).await;
        let stats = handle.stop().await.unwrap();

        assert_eq!(stats.cycles, 1);
        assert_eq!(transport.lines().len(), 1);
        assert_eq!(transport.closes(), 1);
        assert_eq!(provider.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn never_opened_transport_is_closed_once() {
        let provider = Arc::new(FakeProvider::cpu_and_gpu(60.0, 50.0));
        let transport = RecordingTransport::never_opened();
        let handle = MonitorHandle::spawn(monitor(&provider, &transport));

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.stop().await.unwrap();

        assert_eq!(transport.closes(), 1);
        assert_eq!(provider.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_before_start_runs_no_cycle() {
        let provider = Arc::new(FakeProvider::cpu_and_gpu(60.0, 50.0));
        let transport = RecordingTransport::open();
        let mut m = monitor(&provider, &transport);
        assert_eq!(m.state(), MonitorState::Idle);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let stats = m.run(cancel).await;

        assert_eq!(stats.cycles, 0);
        assert!(transport.lines().is_empty());

        // Loop encerrado, recursos ainda abertos até o shutdown
        assert_eq!(m.state(), MonitorState::Stopping);
        assert_eq!(transport.closes(), 0);
        m.shutdown();
        assert_eq!(m.state(), MonitorState::Stopped);
        assert_eq!(transport.closes(), 1);
    }

    #[tokio::test]
    async fn stop_waits_for_read_in_progress() {
        let provider = Arc::new(FakeProvider::cpu_and_gpu(60.0, 50.0));
        provider.set_refresh_delay(Duration::from_millis(200));
        let transport = RecordingTransport::open();
        let handle = MonitorHandle::spawn(monitor(&provider, &transport));

        wait_until(|| provider.refreshes.load(Ordering::SeqCst) > 0).await;
        let stats = handle.stop().await.unwrap();

        // As duas leituras terminaram antes do provedor ser fechado
        assert_eq!(provider.events(), ["refresh", "refresh", "close"]);
        assert_eq!(stats.cycles, 1);
        assert_eq!(transport.lines(), ["CPU:60.0,GPU:50.0\n"]);
        assert_eq!(transport.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_cancels_and_releases() {
        let provider = Arc::new(FakeProvider::cpu_and_gpu(60.0, 50.0));
        let transport = RecordingTransport::open();
        let handle = MonitorHandle::spawn(monitor(&provider, &transport));

        wait_until(|| transport.lines().len() == 1).await;
        drop(handle);

        wait_until(|| provider.closes.load(Ordering::SeqCst) == 1).await;
        assert_eq!(transport.closes(), 1);

        // Intervalo padrão de 10 s: o loop não roda outro ciclo
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(transport.lines().len(), 1);
        assert_eq!(provider.refreshes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn double_shutdown_closes_once() {
        let provider = Arc::new(FakeProvider::cpu_and_gpu(60.0, 50.0));
        let transport = RecordingTransport::open();
        let mut m = monitor(&provider, &transport);

        m.shutdown();
        m.shutdown();
        drop(m);

        assert_eq!(transport.closes(), 1);
        assert_eq!(provider.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases_resources() {
        let provider = Arc::new(FakeProvider::cpu_and_gpu(60.0, 50.0));
        let transport = RecordingTransport::open();
        drop(monitor(&provider, &transport));

        assert_eq!(transport.closes(), 1);
        assert_eq!(provider.closes.load(Ordering::SeqCst), 1);
    }
}
