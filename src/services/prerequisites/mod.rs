//! 前置作业门禁
//!
//! 判定学生能否开始某作业：前置集合为空直接放行；有生效的前置豁免按
//! 豁免负载放行或剔除；剩余前置按作业范围过滤后逐一检查完成情况。
//! 前置关系整体必须保持 DAG，插边前做 DFS 环检测。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::info;

use crate::errors::{AssessmentError, Result};
use crate::models::assignments::entities::{Assignment, AssignmentScope};
use crate::models::overrides::entities::{OverrideKind, OverrideValue};
use crate::storage::Storage;

/// 门禁判定结果
#[derive(Debug, Clone)]
pub struct PrerequisiteCheck {
    pub passed: bool,
    // 未完成的前置作业 ID
    pub incomplete: Vec<i64>,
}

impl PrerequisiteCheck {
    fn pass() -> Self {
        Self {
            passed: true,
            incomplete: Vec::new(),
        }
    }

    fn fail(incomplete: Vec<i64>) -> Self {
        Self {
            passed: false,
            incomplete,
        }
    }
}

pub struct PrerequisiteGate {
    storage: Arc<dyn Storage>,
}

impl PrerequisiteGate {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// 判定学生是否满足作业的前置要求
    ///
    /// 缺失数据（前置作业不存在等）按未完成处理，门禁向关闭方向收敛。
    pub async fn check(&self, assignment_id: i64, student_id: i64) -> Result<PrerequisiteCheck> {
        let assignment = self
            .storage
            .get_assignment_by_id(assignment_id)
            .await?
            .ok_or_else(|| AssessmentError::not_found(format!("作业不存在: {assignment_id}")))?;

        let prerequisite_ids = self.storage.list_prerequisites(assignment_id).await?;
        if prerequisite_ids.is_empty() {
            return Ok(PrerequisiteCheck::pass());
        }

        // 生效的前置豁免：负载为空列表时整体放行，否则仅剔除列出的前置
        let mut bypassed: HashSet<i64> = HashSet::new();
        if let Some(ov) = self
            .storage
            .find_active_override(
                assignment_id,
                student_id,
                OverrideKind::Prerequisite,
                chrono::Utc::now(),
            )
            .await?
            && let OverrideValue::Prerequisite {
                bypassed_prerequisites,
            } = ov.value
        {
            if bypassed_prerequisites.is_empty() {
                return Ok(PrerequisiteCheck::pass());
            }
            bypassed = bypassed_prerequisites.into_iter().collect();
        }

        let mut incomplete = Vec::new();
        for prereq_id in prerequisite_ids {
            if bypassed.contains(&prereq_id) {
                continue;
            }

            let Some(prereq) = self.storage.get_assignment_by_id(prereq_id).await? else {
                // 悬空前置按未完成处理
                incomplete.push(prereq_id);
                continue;
            };

            if !scope_relevant(&assignment, &prereq) {
                continue;
            }

            let submissions = self
                .storage
                .list_submissions_by_student(prereq_id, student_id)
                .await?;
            let completed = submissions.iter().any(|s| s.state.counts_as_completed());
            if !completed {
                incomplete.push(prereq_id);
            }
        }

        if incomplete.is_empty() {
            Ok(PrerequisiteCheck::pass())
        } else {
            Ok(PrerequisiteCheck::fail(incomplete))
        }
    }

    /// 挂接一条前置边，保持前置关系无环
    pub async fn add_prerequisite(
        &self,
        actor_id: i64,
        assignment_id: i64,
        prerequisite_id: i64,
    ) -> Result<()> {
        if assignment_id == prerequisite_id {
            return Err(AssessmentError::validation("作业不能作为自身的前置"));
        }

        for id in [assignment_id, prerequisite_id] {
            self.storage
                .get_assignment_by_id(id)
                .await?
                .ok_or_else(|| AssessmentError::not_found(format!("作业不存在: {id}")))?;
        }

        let edges = self.storage.list_all_prerequisite_edges().await?;
        let adjacency = build_adjacency(&edges);
        if creates_cycle(&adjacency, assignment_id, prerequisite_id) {
            return Err(AssessmentError::validation(format!(
                "前置关系成环: {assignment_id} -> {prerequisite_id}"
            )));
        }

        self.storage
            .add_prerequisite_edge(assignment_id, prerequisite_id)
            .await?;
        info!(actor_id, assignment_id, prerequisite_id, "prerequisite edge added");
        Ok(())
    }
}

/// 前置是否与作业范围相关
///
/// 课时级作业只看课时级前置；单元级作业看单元级前置，外加同单元的
/// 课时级前置；课程级作业全部纳入。
fn scope_relevant(assignment: &Assignment, prereq: &Assignment) -> bool {
    match assignment.scope() {
        AssignmentScope::Course => true,
        AssignmentScope::Unit => match prereq.scope() {
            AssignmentScope::Unit => true,
            AssignmentScope::Lesson => prereq.unit_id == assignment.unit_id,
            AssignmentScope::Course => false,
        },
        AssignmentScope::Lesson => prereq.scope() == AssignmentScope::Lesson,
    }
}

/// 全量前置边 -> 邻接表（assignment -> 它的前置）
pub fn build_adjacency(edges: &[(i64, i64)]) -> HashMap<i64, Vec<i64>> {
    let mut adjacency: HashMap<i64, Vec<i64>> = HashMap::new();
    for &(from, to) in edges {
        adjacency.entry(from).or_default().push(to);
    }
    adjacency
}

/// 插入 from -> to 是否会造成环
///
/// 等价于：沿现有前置边能否从 to 走回 from。
pub fn creates_cycle(adjacency: &HashMap<i64, Vec<i64>>, from: i64, to: i64) -> bool {
    let mut visited = HashSet::new();
    let mut stack = vec![to];
    while let Some(node) = stack.pop() {
        if node == from {
            return true;
        }
        if !visited.insert(node) {
            continue;
        }
        if let Some(nexts) = adjacency.get(&node) {
            stack.extend(nexts.iter().copied());
        }
    }
    false
}
