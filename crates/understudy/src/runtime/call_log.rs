use crate::expect::BehaviorKind;
use crate::runtime::value::Value;

/// One invocation of a double's method.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    /// 1-based call index for this method.
    pub index:    usize,
    /// Session-wide order stamp; compares calls across methods and doubles.
    pub sequence: u64,
    /// Arguments as passed, before the behavior ran.
    pub args:     Vec<Value>,
    pub behavior: BehaviorKind,
}

/// Ordered calls to one method of one double.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallLog {
    records: Vec<CallRecord>,
}

impl CallLog {
    /// Append a call and return its index.
    pub fn push(&mut self, sequence: u64, args: Vec<Value>, behavior: BehaviorKind) -> usize {
        let index = self.records.len() + 1;
        self.records.push(CallRecord { index, sequence, args, behavior });
        index
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn records(&self) -> &[CallRecord] { &self.records }

    /// Record for the 1-based call `index`.
    pub fn get(&self, index: usize) -> Option<&CallRecord> {
        index.checked_sub(1).and_then(|i| self.records.get(i))
    }

    pub fn last(&self) -> Option<&CallRecord> { self.records.last() }

    /// Arguments of the 1-based call `index`.
    pub fn args_of(&self, index: usize) -> Option<&[Value]> {
        self.get(index).map(|r| r.args.as_slice())
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }
}
