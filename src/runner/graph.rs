use crate::parser::{Suite, TestRequest};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// 单个套件的依赖图
///
/// 边从前置请求指向依赖它的请求。入度与计数器只由调度任务修改。
#[derive(Debug)]
pub struct DependencyGraph {
    suite: Arc<str>,
    nodes: Vec<Arc<TestRequest>>,
    index: HashMap<String, usize>,
    in_degree: Vec<usize>,
    children: Vec<Vec<usize>>,
    /// (请求下标, 不存在的依赖名)
    dangling: Vec<(usize, String)>,
    /// 重名且被忽略的请求定义
    duplicates: Vec<Arc<TestRequest>>,
    dispatched: usize,
    completed: usize,
}

impl DependencyGraph {
    pub fn build(suite: &Suite) -> Self {
        let mut nodes = Vec::with_capacity(suite.requests.len());
        let mut index = HashMap::new();
        let mut duplicates = Vec::new();

        for request in &suite.requests {
            if index.contains_key(&request.name) {
                duplicates.push(Arc::new(request.clone()));
                continue;
            }
            index.insert(request.name.clone(), nodes.len());
            nodes.push(Arc::new(request.clone()));
        }

        let mut in_degree = vec![0; nodes.len()];
        let mut children = vec![Vec::new(); nodes.len()];
        let mut dangling = Vec::new();

        for (idx, request) in nodes.iter().enumerate() {
            for dependency in &request.depends_on {
                match index.get(dependency) {
                    Some(&parent) => {
                        in_degree[idx] += 1;
                        children[parent].push(idx);
                    }
                    None => dangling.push((idx, dependency.clone())),
                }
            }
        }

        Self {
            suite: Arc::from(suite.name.as_str()),
            nodes,
            index,
            in_degree,
            children,
            dangling,
            duplicates,
            dispatched: 0,
            completed: 0,
        }
    }

    pub fn suite_name(&self) -> &Arc<str> {
        &self.suite
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn request(&self, idx: usize) -> &Arc<TestRequest> {
        &self.nodes[idx]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// 入度为零、可以立即执行的请求（按声明顺序）
    pub fn roots(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&idx| self.in_degree[idx] == 0)
            .collect()
    }

    pub fn dangling(&self) -> &[(usize, String)] {
        &self.dangling
    }

    pub fn duplicates(&self) -> &[Arc<TestRequest>] {
        &self.duplicates
    }

    /// 永远不会变为可执行的请求：环上的请求以及依赖环的请求
    ///
    /// 在入度副本上跑 Kahn 算法，剩余未出队的节点即为结果。
    pub fn unschedulable(&self) -> Vec<usize> {
        let mut in_degree = self.in_degree.clone();
        let mut queue: VecDeque<usize> = self.roots().into();
        let mut reached = vec![false; self.nodes.len()];

        while let Some(idx) = queue.pop_front() {
            reached[idx] = true;
            for &child in &self.children[idx] {
                in_degree[child] -= 1;
                if in_degree[child] == 0 {
                    queue.push_back(child);
                }
            }
        }

        (0..self.nodes.len()).filter(|&idx| !reached[idx]).collect()
    }

    pub fn mark_dispatched(&mut self) {
        self.dispatched += 1;
    }

    /// 标记请求完成，返回因此变为可执行的请求
    pub fn complete(&mut self, idx: usize) -> Vec<usize> {
        self.completed += 1;
        let mut ready = Vec::new();
        for &child in &self.children[idx] {
            self.in_degree[child] = self.in_degree[child].saturating_sub(1);
            if self.in_degree[child] == 0 {
                ready.push(child);
            }
        }
        ready
    }

    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    pub fn completed(&self) -> usize {
        self.completed
    }
}
