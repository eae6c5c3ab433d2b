//! Latest-value store for the monitored datasets.

use crate::model::{DatasetKind, Patch, RiskSnapshot, Snapshot};
use crate::render::{DatasetUpdate, RenderBoundary, RenderEvent};
use std::collections::HashMap;
use tracing::debug;

/// Holds at most one current value per [`DatasetKind`].
///
/// Writes are applied in call order regardless of whether they came from a
/// poll or a push: the last one applied wins. Every write is forwarded to
/// the render boundary before the call returns.
pub struct SnapshotStore {
    current: HashMap<DatasetKind, Snapshot>,
    render: RenderBoundary,
}

impl SnapshotStore {
    pub fn new(render: RenderBoundary) -> Self {
        Self {
            current: HashMap::new(),
            render,
        }
    }

    /// Wholesale overwrite of the snapshot's kind
    pub fn replace(&mut self, snapshot: Snapshot) {
        let kind = snapshot.kind();
        debug!(%kind, "Replacing snapshot");
        self.current.insert(kind, snapshot.clone());
        self.render
            .emit(RenderEvent::Dataset(DatasetUpdate::Replaced { snapshot }));
    }

    /// Overwrite only the fields present in `patch`.
    ///
    /// A kind that was never populated is merged onto its zero value.
    pub fn merge_fields(&mut self, patch: Patch) {
        let merged = match &patch {
            Patch::Risk(risk_patch) => {
                let mut risk = self.risk().cloned().unwrap_or_default();
                risk.apply(risk_patch);
                Snapshot::Risk(risk)
            }
        };
        self.current.insert(patch.kind(), merged.clone());
        debug!(kind = %patch.kind(), fields = ?patch.fields(), "Merged partial snapshot");
        self.render.emit(RenderEvent::Dataset(DatasetUpdate::Merged {
            snapshot: merged,
            patch,
        }));
    }

    /// Latest value, or `None` if the kind was never populated
    pub fn current(&self, kind: DatasetKind) -> Option<&Snapshot> {
        self.current.get(&kind)
    }

    pub fn risk(&self) -> Option<&RiskSnapshot> {
        match self.current(DatasetKind::Risk) {
            Some(Snapshot::Risk(risk)) => Some(risk),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PortfolioSnapshot, RiskPatch};
    use proptest::prelude::*;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn store() -> (SnapshotStore, UnboundedReceiver<RenderEvent>) {
        let (render, rx) = RenderBoundary::channel();
        (SnapshotStore::new(render), rx)
    }

    fn risk(cva: f64) -> RiskSnapshot {
        RiskSnapshot {
            total_pv: None,
            cva,
            dva: 5_000.0,
            fva: -8_000.0,
            total_xva: cva - 3_000.0,
            ee: 500_000.0,
            epe: 450_000.0,
            pfe: 800_000.0,
        }
    }

    #[test]
    fn test_current_absent_until_populated() {
        let (store, _rx) = store();
        assert!(store.current(DatasetKind::Portfolio).is_none());
        assert!(store.current(DatasetKind::Exposure).is_none());
        assert!(store.risk().is_none());
    }

    #[test]
    fn test_replace_notifies_synchronously() {
        let (mut store, mut rx) = store();
        let portfolio = PortfolioSnapshot {
            total_pv: 1_000_000.0,
            trade_count: 0,
            trades: vec![],
        };
        store.replace(Snapshot::Portfolio(portfolio.clone()));

        let event = rx.try_recv().unwrap();
        assert_eq!(
            event,
            RenderEvent::Dataset(DatasetUpdate::Replaced {
                snapshot: Snapshot::Portfolio(portfolio)
            })
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_replace_discards_previous_fields() {
        let (mut store, _rx) = store();
        store.replace(Snapshot::Risk(risk(-500.0)));
        store.merge_fields(Patch::Risk(RiskPatch {
            total_pv: Some(1_100_000.0),
            ..RiskPatch::default()
        }));
        store.replace(Snapshot::Risk(risk(-700.0)));

        assert_eq!(store.risk(), Some(&risk(-700.0)));
    }

    #[test]
    fn test_merge_reports_patch_and_merged_value() {
        let (mut store, mut rx) = store();
        store.replace(Snapshot::Risk(risk(-500.0)));
        let _ = rx.try_recv();

        let patch = Patch::Risk(RiskPatch {
            total_pv: Some(1_100_000.0),
            ..RiskPatch::default()
        });
        store.merge_fields(patch.clone());

        let mut expected = risk(-500.0);
        expected.total_pv = Some(1_100_000.0);
        match rx.try_recv().unwrap() {
            RenderEvent::Dataset(DatasetUpdate::Merged { snapshot, patch: got }) => {
                assert_eq!(snapshot, Snapshot::Risk(expected));
                assert_eq!(got, patch);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_merge_into_empty_store_starts_from_zero() {
        let (mut store, _rx) = store();
        store.merge_fields(Patch::Risk(RiskPatch {
            ee: Some(42.0),
            ..RiskPatch::default()
        }));
        let risk = store.risk().unwrap();
        assert_eq!(risk.ee, 42.0);
        assert_eq!(risk.cva, 0.0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Replace(RiskSnapshot),
        Merge(RiskPatch),
    }

    fn opt() -> impl Strategy<Value = Option<f64>> {
        proptest::option::of(-1.0e6f64..1.0e6)
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let replace = (-1.0e6f64..1.0e6, -1.0e6f64..1.0e6).prop_map(|(cva, ee)| {
            let mut snapshot = risk(cva);
            snapshot.ee = ee;
            Op::Replace(snapshot)
        });
        let merge = (opt(), opt(), opt(), opt(), opt()).prop_map(|(total_pv, cva, dva, ee, pfe)| {
            Op::Merge(RiskPatch {
                total_pv,
                cva,
                dva,
                ee,
                pfe,
                ..RiskPatch::default()
            })
        });
        prop_oneof![replace, merge]
    }

    proptest! {
        #[test]
        fn test_last_replace_overlaid_by_later_merges(ops in proptest::collection::vec(op_strategy(), 1..20)) {
            let (mut store, _rx) = store();
            for op in &ops {
                match op {
                    Op::Replace(snapshot) => store.replace(Snapshot::Risk(snapshot.clone())),
                    Op::Merge(patch) => store.merge_fields(Patch::Risk(patch.clone())),
                }
            }

            let last_replace = ops.iter().rposition(|op| matches!(op, Op::Replace(_)));
            let mut expected = match last_replace {
                Some(i) => match &ops[i] {
                    Op::Replace(snapshot) => snapshot.clone(),
                    Op::Merge(_) => unreachable!(),
                },
                None => RiskSnapshot::default(),
            };
            let start = last_replace.map_or(0, |i| i + 1);
            for op in &ops[start..] {
                if let Op::Merge(patch) = op {
                    expected.apply(patch);
                }
            }

            prop_assert_eq!(store.risk(), Some(&expected));
        }
    }
}
