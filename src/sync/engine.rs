//! 配置同步引擎
//!
//! 持有内存中的配置快照，并按模式周期性地写回（autosave）或重新加载
//! （autoreload）。所有读改写都在同一把 `RwLock` 下串行化，后台任务
//! 不会在持锁期间执行文件 I/O。保存与重载各自的"读取-写文件-记录"
//! 序列由 `io_gate` 串行化，前台调用与后台周期不会交错。

use crate::codec::{self, ConfigCodec, Format};
use crate::error::Result;
use crate::schema::ClassRegistry;
use crate::sync::options::{SyncMode, SyncOptions};
use crate::value::{Snapshot, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// 同步事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// 内存快照已写回文件
    Saved { version: u64 },
    /// 已从文件重新加载快照
    Reloaded { version: u64 },
}

impl SyncEvent {
    pub fn version(&self) -> u64 {
        match self {
            SyncEvent::Saved { version } | SyncEvent::Reloaded { version } => *version,
        }
    }
}

/// 受同一把锁保护的同步状态
#[derive(Debug)]
struct SyncState {
    /// 当前生效的快照
    live: Snapshot,
    /// 最后一次与文件一致的快照
    last_observed: Snapshot,
    /// 每次保存或重载后递增
    version: u64,
}

/// 前台与后台任务共享的部分
struct Shared {
    path: PathBuf,
    format: Format,
    codec: ConfigCodec,
    state: RwLock<SyncState>,
    /// 文件读写序列的互斥门
    io_gate: Mutex<()>,
    events: broadcast::Sender<SyncEvent>,
}

/// 配置同步引擎
pub struct ConfigSync {
    shared: Arc<Shared>,
    mode: SyncMode,
    shutdown: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

/// 打开配置文件，等同于 [`ConfigSync::open`]
pub async fn open_config<P: AsRef<Path>>(
    path: P,
    registry: Arc<ClassRegistry>,
    options: SyncOptions,
) -> Result<ConfigSync> {
    ConfigSync::open(path, registry, options).await
}

impl ConfigSync {
    /// 打开配置文件
    ///
    /// 先校验选项并完成首次读取，失败时不会启动后台任务。
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    /// * `registry` - 解析类标记所用的注册表
    /// * `options` - 同步选项
    ///
    /// # 返回
    /// * `Result<Self>` - 同步引擎
    pub async fn open<P: AsRef<Path>>(
        path: P,
        registry: Arc<ClassRegistry>,
        options: SyncOptions,
    ) -> Result<Self> {
        let mode = options.mode()?;
        let path = path.as_ref().to_path_buf();
        let format = Format::resolve(&path, options.explicit_format())?;
        let codec = ConfigCodec::new(registry);

        let snapshot = codec.read_file(&path, Some(format)).await?;
        info!(
            "打开配置文件: {} (格式: {}, 模式: {})",
            path.display(),
            format,
            mode
        );

        let (events, _) = broadcast::channel(options.capacity());
        let shared = Arc::new(Shared {
            path,
            format,
            codec,
            state: RwLock::new(SyncState {
                last_observed: snapshot.clone(),
                live: snapshot,
                version: 0,
            }),
            io_gate: Mutex::new(()),
            events,
        });

        let mut engine = Self {
            shared,
            mode,
            shutdown: None,
            task: None,
        };

        if mode.is_periodic() {
            engine.spawn_worker(options.interval());
        }

        Ok(engine)
    }

    fn spawn_worker(&mut self, tick: Duration) {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let shared = Arc::clone(&self.shared);
        let mode = self.mode;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + tick, tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            debug!("启动同步任务: {} ({})", shared.path.display(), mode);

            loop {
                tokio::select! {
                    biased;
                    changed = shutdown_rx.changed() => {
                        // 发送端被丢弃时同样退出
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        let outcome = match mode {
                            SyncMode::AutoSave => shared.autosave_tick().await,
                            SyncMode::AutoReload => shared.autoreload_tick().await,
                            SyncMode::Static => Ok(()),
                        };
                        if let Err(e) = outcome {
                            warn!("同步失败，跳过本次周期 {}: {}", shared.path.display(), e);
                        }
                    }
                }
            }

            debug!("同步任务已退出: {}", shared.path.display());
        });

        self.shutdown = Some(shutdown_tx);
        self.task = Some(task);
    }

    /// 当前快照的副本
    pub async fn snapshot(&self) -> Snapshot {
        self.shared.state.read().await.live.clone()
    }

    /// 整体替换当前快照
    pub async fn replace_snapshot(&self, snapshot: Snapshot) {
        self.shared.state.write().await.live = snapshot;
    }

    /// 在锁内修改当前快照
    ///
    /// 闭包返回错误时已做出的修改保留，错误原样返回。
    pub async fn update<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Snapshot) -> Result<T>,
    {
        let mut state = self.shared.state.write().await;
        f(&mut state.live)
    }

    /// 读取顶层键
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.shared.state.read().await.live.get(key).cloned()
    }

    /// 最后一次与文件一致的快照
    pub async fn last_observed(&self) -> Snapshot {
        self.shared.state.read().await.last_observed.clone()
    }

    pub async fn version(&self) -> u64 {
        self.shared.state.read().await.version
    }

    /// 订阅同步事件
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.shared.events.subscribe()
    }

    /// 立即写回文件
    pub async fn save(&self) -> Result<()> {
        self.shared.save().await.map(|_| ())
    }

    /// 立即从文件重新加载，无论内容是否变化
    pub async fn reload(&self) -> Result<()> {
        self.shared.reload(true).await.map(|_| ())
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    pub fn format(&self) -> Format {
        self.shared.format
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    /// 后台任务是否仍在运行
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// 停止后台任务并等待其退出
    ///
    /// 返回后不会再发生任何读写，重复调用无副作用。
    pub async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    error!("同步任务异常退出 {}: {}", self.shared.path.display(), e);
                }
            }
            info!("已停止配置同步: {}", self.shared.path.display());
        }
    }
}

impl Shared {
    /// autosave 周期：内存快照与上次观察值不同时写回
    async fn autosave_tick(&self) -> Result<()> {
        let pending = {
            let state = self.state.read().await;
            state.live != state.last_observed
        };

        if pending {
            self.save().await?;
        }
        Ok(())
    }

    /// autoreload 周期：文件内容与内存快照不同时整体替换
    async fn autoreload_tick(&self) -> Result<()> {
        self.reload(false).await?;
        Ok(())
    }

    /// 写回当前快照，返回新版本号
    async fn save(&self) -> Result<u64> {
        let _gate = self.io_gate.lock().await;
        let written = self.state.read().await.live.clone();

        codec::write_file(&self.path, &written, Some(self.format)).await?;

        let version = {
            let mut state = self.state.write().await;
            state.last_observed = written;
            state.version += 1;
            state.version
        };

        debug!("配置已写回: {} (版本: {})", self.path.display(), version);
        let _ = self.events.send(SyncEvent::Saved { version });
        Ok(version)
    }

    /// 从文件重新加载，`force` 为假时内容不变则跳过
    async fn reload(&self, force: bool) -> Result<Option<u64>> {
        let _gate = self.io_gate.lock().await;
        let fresh = self.codec.read_file(&self.path, Some(self.format)).await?;

        let version = {
            let mut state = self.state.write().await;
            if !force && state.live == fresh {
                return Ok(None);
            }
            state.last_observed = fresh.clone();
            state.live = fresh;
            state.version += 1;
            state.version
        };

        info!("配置已重新加载: {} (版本: {})", self.path.display(), version);
        let _ = self.events.send(SyncEvent::Reloaded { version });
        Ok(Some(version))
    }
}

impl Drop for ConfigSync {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for ConfigSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigSync")
            .field("path", &self.shared.path)
            .field("format", &self.shared.format)
            .field("mode", &self.mode)
            .field("running", &self.is_running())
            .finish()
    }
}
