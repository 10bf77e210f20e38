//! Append-only stack history ledger.

use std::sync::RwLock;

use async_trait::async_trait;
use techstacks_core::{
    AuditError, EntityIdType, HistoryId, HistoryRecord, NewHistoryRecord, StackId,
    TechStacksResult,
};

/// Append-only store of post-mutation stack snapshots.
///
/// Records are never updated or deleted, and they outlive the stack they
/// describe.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Persist one history record and return it with its assigned id.
    async fn append(&self, record: NewHistoryRecord) -> TechStacksResult<HistoryRecord>;

    /// All records for a stack in append order.
    async fn history_for(&self, stack_id: StackId) -> TechStacksResult<Vec<HistoryRecord>>;
}

/// Vector-backed ledger.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    records: RwLock<Vec<HistoryRecord>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all stacks.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn append(&self, record: NewHistoryRecord) -> TechStacksResult<HistoryRecord> {
        let stack_id = record.stack_id;
        let mut records = self.records.write().map_err(|_| AuditError::AppendFailed {
            stack_id: stack_id.as_i64(),
            reason: "history lock poisoned".to_string(),
        })?;
        let id = HistoryId::new(records.len() as i64 + 1);
        let stored = record.into_record(id);
        records.push(stored.clone());
        Ok(stored)
    }

    async fn history_for(&self, stack_id: StackId) -> TechStacksResult<Vec<HistoryRecord>> {
        let records = self.records.read().map_err(|_| AuditError::ReadFailed {
            reason: "history lock poisoned".to_string(),
        })?;
        Ok(records
            .iter()
            .filter(|r| r.stack_id == stack_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use techstacks_core::{now, ActorContext, StackDraft, StackOperation};

    #[tokio::test]
    async fn test_history_is_filtered_and_ordered() {
        let log = InMemoryAuditLog::new();
        let actor = ActorContext::new("u1", "alice");
        let stack = StackDraft::new("Rust", "")
            .into_new_stack(&actor, now())
            .unwrap()
            .into_stack(StackId::new(1));
        let other = StackDraft::new("Go", "")
            .into_new_stack(&actor, now())
            .unwrap()
            .into_stack(StackId::new(2));

        for op in [StackOperation::Create, StackOperation::Update] {
            log.append(NewHistoryRecord::snapshot(&stack, op, &actor, now()))
                .await
                .unwrap();
        }
        log.append(NewHistoryRecord::snapshot(&other, StackOperation::Create, &actor, now()))
            .await
            .unwrap();

        let history = log.history_for(stack.id).await.unwrap();
        let ops: Vec<StackOperation> = history.iter().map(|r| r.operation).collect();
        assert_eq!(ops, vec![StackOperation::Create, StackOperation::Update]);
        assert_eq!(log.len(), 3);
        assert!(history[0].id < history[1].id);
    }
}
