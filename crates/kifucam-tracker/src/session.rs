//! 指し手推定のワーカースレッド
//!
//! `Tracker` を1本のスレッドが所有し、フレームを到着順に1枚ずつ処理する。
//! フレームの受け口は1枚分しかなく、処理が追いつかないときは古いフレームを捨てる。
//! 盤面の参照は状態を直接共有せず、要求と応答のメッセージで行う。

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, select, unbounded};
use kifucam_core::NotationStyle;
use kifucam_core::types::json::BoardStateJson;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::tracker::{ConfirmedMove, Observation, Tracker, TrackerPhase};
use crate::vision::Vision;

/// ワーカーからの通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    MoveConfirmed(ConfirmedMove),
}

/// 表示層向けの対局状態
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub board: BoardStateJson,
    /// KIF表記の指し手列
    pub moves: Vec<String>,
    pub phase: TrackerPhase,
    pub flipped: bool,
}

impl GameSnapshot {
    pub fn from_tracker<V: Vision>(tracker: &Tracker<V>) -> Self {
        let game = tracker.game();
        GameSnapshot {
            board: game.to_json(),
            moves: game.notations(NotationStyle::Kif),
            phase: tracker.phase(),
            flipped: tracker.is_flipped(),
        }
    }
}

enum Control {
    Snapshot(Sender<GameSnapshot>),
    Rebaseline,
    Shutdown,
}

/// 1要素だけ保持するキュー（満杯なら古い要素を捨てて入れ替える）
struct LatestSlot<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> LatestSlot<T> {
    fn new() -> Self {
        let (tx, rx) = bounded(1);
        LatestSlot { tx, rx }
    }

    /// 要素を入れる。古い要素を捨てた場合はtrue
    fn offer(&self, item: T) -> Result<bool, SessionError> {
        let mut item = item;
        let mut evicted = false;
        loop {
            match self.tx.try_send(item) {
                Ok(()) => return Ok(evicted),
                Err(TrySendError::Full(back)) => {
                    evicted |= self.rx.try_recv().is_ok();
                    item = back;
                }
                Err(TrySendError::Disconnected(_)) => return Err(SessionError::Closed),
            }
        }
    }

    fn receiver(&self) -> Receiver<T> {
        self.rx.clone()
    }
}

/// 指し手推定のセッション
///
/// drop時にはワーカーを止めて合流する。`Tracker` を取り戻すには `shutdown` を使う。
pub struct TrackerSession<V: Vision> {
    frames: LatestSlot<V::Image>,
    control_tx: Sender<Control>,
    event_rx: Receiver<TrackerEvent>,
    handle: Option<JoinHandle<Tracker<V>>>,
}

impl<V> TrackerSession<V>
where
    V: Vision + Send + 'static,
    V::Image: Send + 'static,
{
    /// ワーカースレッドを起動する
    pub fn spawn(tracker: Tracker<V>) -> Self {
        let frames = LatestSlot::new();
        let (control_tx, control_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let frame_rx = frames.receiver();
        let handle = thread::spawn(move || run_worker(tracker, frame_rx, control_rx, event_tx));
        TrackerSession {
            frames,
            control_tx,
            event_rx,
            handle: Some(handle),
        }
    }
}

impl<V: Vision> TrackerSession<V> {
    /// フレームを渡す（未処理のフレームがあれば置き換える）
    pub fn submit(&self, frame: V::Image) -> Result<(), SessionError> {
        if self.handle.as_ref().is_none_or(|h| h.is_finished()) {
            return Err(SessionError::Closed);
        }
        if self.frames.offer(frame)? {
            log::debug!("Tracker is behind, dropped a stale frame");
        }
        Ok(())
    }

    /// 現在の対局状態
    ///
    /// 受け口に残っているフレームを処理してから応答する。
    pub fn snapshot(&self) -> Result<GameSnapshot, SessionError> {
        let (reply_tx, reply_rx) = bounded(1);
        self.control_tx
            .send(Control::Snapshot(reply_tx))
            .map_err(|_| SessionError::Closed)?;
        reply_rx.recv().map_err(|_| SessionError::Closed)
    }

    /// 基準盤面を取り直させる
    pub fn rebaseline(&self) -> Result<(), SessionError> {
        self.control_tx.send(Control::Rebaseline).map_err(|_| SessionError::Closed)
    }

    /// 確定した指し手の通知
    #[inline]
    pub fn events(&self) -> &Receiver<TrackerEvent> {
        &self.event_rx
    }

    /// ワーカーを止めて `Tracker` を取り戻す
    pub fn shutdown(mut self) -> Result<Tracker<V>, SessionError> {
        let _ = self.control_tx.send(Control::Shutdown);
        let handle = self.handle.take().ok_or(SessionError::Closed)?;
        handle.join().map_err(|_| SessionError::WorkerPanicked)
    }
}

impl<V: Vision> Drop for TrackerSession<V> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.control_tx.send(Control::Shutdown);
            if handle.join().is_err() {
                log::error!("Tracker worker panicked");
            }
        }
    }
}

fn run_worker<V: Vision>(
    mut tracker: Tracker<V>,
    frames: Receiver<V::Image>,
    control: Receiver<Control>,
    events: Sender<TrackerEvent>,
) -> Tracker<V> {
    let observe = |tracker: &mut Tracker<V>, frame: V::Image| {
        if let Observation::Confirmed(confirmed) = tracker.observe(frame)
            && events.send(TrackerEvent::MoveConfirmed(confirmed)).is_err()
        {
            log::debug!("Event receiver dropped");
        }
    };

    loop {
        select! {
            recv(control) -> msg => match msg {
                Ok(Control::Snapshot(reply)) => {
                    if let Ok(frame) = frames.try_recv() {
                        observe(&mut tracker, frame);
                    }
                    let _ = reply.send(GameSnapshot::from_tracker(&tracker));
                }
                Ok(Control::Rebaseline) => tracker.rebaseline(),
                Ok(Control::Shutdown) | Err(_) => break,
            },
            recv(frames) -> frame => match frame {
                Ok(frame) => observe(&mut tracker, frame),
                Err(_) => break,
            },
        }
    }
    log::debug!("Tracker worker exiting at ply {}", tracker.game().ply());
    tracker
}
