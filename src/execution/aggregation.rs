use std::collections::HashMap;

use crate::common::config::DEFAULT_AGGREGATION_CAPACITY;
use crate::common::rid::Rid;
use crate::expression::Expression;
use crate::types::tuple::{Tuple, TupleRecord};
use crate::types::value::Value;

use super::plan::AggregateType;
use super::Executor;

/// Drains its child into an in-memory hash table keyed by the group-by
/// tuple, accumulating each aggregate per section 4.7's combination
/// rules, then emits one row per group concatenating the group key with
/// its aggregate values.
pub struct AggregationExecutor {
    group_by: Vec<Expression>,
    aggregates: Vec<(AggregateType, Expression)>,
    child: Box<dyn Executor>,
    groups: Vec<(Vec<Value>, Vec<Value>)>,
    emit_idx: usize,
}

impl AggregationExecutor {
    pub fn new(group_by: Vec<Expression>, aggregates: Vec<(AggregateType, Expression)>, child: Box<dyn Executor>) -> Self {
        Self { group_by, aggregates, child, groups: Vec::new(), emit_idx: 0 }
    }

    fn initial_values(&self) -> Vec<Value> {
        self.aggregates
            .iter()
            .map(|(kind, _)| match kind {
                AggregateType::CountStar => Value::Integer(0),
                _ => Value::Null,
            })
            .collect()
    }

    fn combine(&self, state: &mut [Value], input: &Tuple) {
        for (slot, (kind, expr)) in state.iter_mut().zip(&self.aggregates) {
            let value = expr.evaluate(input);
            *slot = match kind {
                AggregateType::CountStar => slot.add(&Value::Integer(1)),
                AggregateType::Count => {
                    if value.is_null() {
                        slot.clone()
                    } else if slot.is_null() {
                        Value::Integer(1)
                    } else {
                        slot.add(&Value::Integer(1))
                    }
                }
                AggregateType::Sum => {
                    if value.is_null() {
                        slot.clone()
                    } else if slot.is_null() {
                        value.clone()
                    } else {
                        slot.add(&value)
                    }
                }
                AggregateType::Min => {
                    if value.is_null() {
                        slot.clone()
                    } else if slot.is_null() || value.compare(slot) == std::cmp::Ordering::Less {
                        value.clone()
                    } else {
                        slot.clone()
                    }
                }
                AggregateType::Max => {
                    if value.is_null() {
                        slot.clone()
                    } else if slot.is_null() || value.compare(slot) == std::cmp::Ordering::Greater {
                        value.clone()
                    } else {
                        slot.clone()
                    }
                }
            };
        }
    }
}

impl Executor for AggregationExecutor {
    fn init(&mut self) {
        self.child.init();
        self.emit_idx = 0;

        let mut index: HashMap<Vec<Value>, usize> = HashMap::with_capacity(DEFAULT_AGGREGATION_CAPACITY);
        self.groups.clear();

        while let Some(record) = self.child.next() {
            let key: Vec<Value> = self.group_by.iter().map(|e| e.evaluate(&record.tuple)).collect();
            let idx = *index.entry(key.clone()).or_insert_with(|| {
                self.groups.push((key, self.initial_values()));
                self.groups.len() - 1
            });
            let (_, state) = &mut self.groups[idx];
            let mut state = std::mem::take(state);
            self.combine(&mut state, &record.tuple);
            self.groups[idx].1 = state;
        }

        if self.groups.is_empty() && self.group_by.is_empty() {
            self.groups.push((Vec::new(), self.initial_values()));
        }
    }

    fn next(&mut self) -> Option<TupleRecord> {
        let (key, values) = self.groups.get(self.emit_idx)?;
        self.emit_idx += 1;
        let mut row = key.clone();
        row.extend(values.iter().cloned());
        Some(TupleRecord { tuple: Tuple::new(row), rid: Rid::new(0, 0) })
    }
}
