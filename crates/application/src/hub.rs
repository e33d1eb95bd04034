//! 在线状态与广播中心
//!
//! 跟踪"哪个用户的哪些连接订阅了哪些房间"，并把新消息实时扇出到
//! 房间内的所有连接。状态只存在于当前进程，跨实例部署需要外部的
//! 共享在线状态存储（不在本设计范围内）。

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Mutex;

use domain::{MessageEvent, RoomId, UserId};
use tokio::sync::mpsc;
use uuid::Uuid;

/// 连接会话句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 一次广播的扇出结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// 已入队投递的会话数
    pub delivered: usize,
    /// 因队列满或连接已关闭而丢弃的会话数
    pub dropped: usize,
}

/// 广播中心的对外口径：发送编排器和离线通知分发器都只依赖这两个操作。
pub trait BroadcastHub: Send + Sync {
    fn broadcast(&self, room_id: RoomId, event: &MessageEvent) -> BroadcastOutcome;
    fn connected_user_ids(&self, room_id: RoomId) -> HashSet<UserId>;
}

struct SessionEntry {
    user_id: UserId,
    rooms: HashSet<RoomId>,
    sender: mpsc::Sender<MessageEvent>,
}

#[derive(Default)]
struct HubState {
    rooms: HashMap<RoomId, HashSet<SessionId>>,
    sessions: HashMap<SessionId, SessionEntry>,
}

/// 进程内的在线状态与广播中心实现。
///
/// 内部两张表在同一把锁下更新，`connected_user_ids` 读到的集合与
/// 订阅/退订操作保持同一瞬间的一致性。临界区内没有任何 await 和
/// 阻塞发送，投递用 `try_send`，慢连接只会丢自己的消息。
pub struct PresenceHub {
    state: Mutex<HubState>,
    queue_capacity: usize,
}

impl PresenceHub {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            state: Mutex::new(HubState::default()),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// 注册一条新连接，返回会话句柄和它的事件接收端。
    pub fn register(&self, user_id: UserId) -> (SessionId, mpsc::Receiver<MessageEvent>) {
        let (sender, receiver) = mpsc::channel(self.queue_capacity);
        let session_id = SessionId::generate();

        let mut state = self.lock();
        state.sessions.insert(
            session_id,
            SessionEntry {
                user_id,
                rooms: HashSet::new(),
                sender,
            },
        );
        drop(state);

        tracing::debug!(session_id = %session_id, user_id = %user_id, "会话注册");
        (session_id, receiver)
    }

    /// 把会话订阅到房间；幂等，未注册的会话返回 false。
    pub fn subscribe(&self, session_id: SessionId, room_id: RoomId) -> bool {
        let mut state = self.lock();
        let Some(entry) = state.sessions.get_mut(&session_id) else {
            return false;
        };
        entry.rooms.insert(room_id);
        state.rooms.entry(room_id).or_default().insert(session_id);
        true
    }

    pub fn unsubscribe(&self, session_id: SessionId, room_id: RoomId) {
        let mut state = self.lock();
        if let Some(entry) = state.sessions.get_mut(&session_id) {
            entry.rooms.remove(&room_id);
        }
        Self::detach_from_room(&mut state, session_id, room_id);
    }

    /// 连接断开时调用：把会话从所有房间移除并释放句柄。
    /// 由传输层在连接关闭路径上保证执行，不依赖客户端的配合。
    pub fn drop_session(&self, session_id: SessionId) {
        let mut state = self.lock();
        let Some(entry) = state.sessions.remove(&session_id) else {
            return;
        };
        for room_id in entry.rooms {
            Self::detach_from_room(&mut state, session_id, room_id);
        }
        drop(state);

        tracing::debug!(session_id = %session_id, "会话清理完成");
    }

    fn detach_from_room(state: &mut HubState, session_id: SessionId, room_id: RoomId) {
        if let Some(sessions) = state.rooms.get_mut(&room_id) {
            sessions.remove(&session_id);
            if sessions.is_empty() {
                state.rooms.remove(&room_id);
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HubState> {
        // 锁内从不 panic，中毒只可能来自不可恢复的 bug
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl BroadcastHub for PresenceHub {
    /// 把事件扇出到房间内的所有会话。
    ///
    /// 先在锁内拍下发送端快照，再在锁外逐个 `try_send`：
    /// 单个慢连接或死连接不会阻塞其他会话的投递。
    fn broadcast(&self, room_id: RoomId, event: &MessageEvent) -> BroadcastOutcome {
        let targets: Vec<(SessionId, mpsc::Sender<MessageEvent>)> = {
            let state = self.lock();
            let Some(session_ids) = state.rooms.get(&room_id) else {
                return BroadcastOutcome::default();
            };
            session_ids
                .iter()
                .filter_map(|id| {
                    state
                        .sessions
                        .get(id)
                        .map(|entry| (*id, entry.sender.clone()))
                })
                .collect()
        };

        let mut outcome = BroadcastOutcome::default();
        for (session_id, sender) in targets {
            match sender.try_send(event.clone()) {
                Ok(()) => outcome.delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    outcome.dropped += 1;
                    tracing::warn!(
                        session_id = %session_id,
                        room_id = %room_id,
                        "会话事件队列已满，丢弃本条广播"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    outcome.dropped += 1;
                    tracing::debug!(
                        session_id = %session_id,
                        room_id = %room_id,
                        "session receiver already closed"
                    );
                }
            }
        }
        outcome
    }

    /// 当前订阅了房间的用户集合，用于离线通知分发器计算补集。
    fn connected_user_ids(&self, room_id: RoomId) -> HashSet<UserId> {
        let state = self.lock();
        let Some(session_ids) = state.rooms.get(&room_id) else {
            return HashSet::new();
        };
        session_ids
            .iter()
            .filter_map(|id| state.sessions.get(id).map(|entry| entry.user_id))
            .collect()
    }
}
