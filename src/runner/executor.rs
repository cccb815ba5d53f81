use crate::Result;
use crate::assertion::{AssertionRegistry, ParamBag, ValidationContext};
use crate::http::{Client, Request, Response};
use crate::parser::TestRequest;
use crate::runner::types::{Outcome, UNKNOWN_EXPECTATION};
use crate::variable::{ValueStore, VariableResolver};
use crate::ApiflowError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 单个请求的执行器：占位符替换 → 发送 → 逐条断言
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: Client,
    registry: Arc<AssertionRegistry>,
}

impl RequestExecutor {
    pub fn new(client: Client, registry: Arc<AssertionRegistry>) -> Self {
        Self { client, registry }
    }

    pub fn registry(&self) -> &AssertionRegistry {
        &self.registry
    }

    /// 执行请求并返回其全部断言结果
    ///
    /// 无法构造或发送时，每个声明的断言各得到一条失败记录。
    pub async fn execute(
        &self,
        suite: &str,
        request: &TestRequest,
        store: &ValueStore,
        cancel: &CancellationToken,
    ) -> Vec<Outcome> {
        let built = match Self::build(request, store) {
            Ok(built) => built,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to build request");
                return Outcome::request_failures(
                    suite,
                    request,
                    &format!("Failed to build request: {}", e),
                );
            }
        };

        tracing::debug!(method = %built.method, url = %built.url, "Sending request");
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ApiflowError::Cancelled),
            result = self.client.execute(built) => result,
        };

        match response {
            Ok(response) => self.evaluate(suite, request, &response, store),
            Err(e) => {
                tracing::warn!(error = %e, "Request failed");
                Outcome::request_failures(suite, request, &format!("Request failed: {}", e))
            }
        }
    }

    /// 把请求定义转换为可发送的请求，替换 URL、头和请求体中的 `${key}`
    pub fn build(request: &TestRequest, store: &ValueStore) -> Result<Request> {
        let url = VariableResolver::substitute(&request.url, store);
        let mut built = Request::new(&request.method, &url)?;

        for (name, value) in &request.headers {
            built = built.with_header(name, &VariableResolver::substitute(value, store))?;
        }
        if let Some(body) = &request.body {
            built = built.with_body(VariableResolver::substitute(body, store));
        }
        if let Some(timeout) = request.timeout() {
            built = built.with_timeout(timeout);
        }

        Ok(built)
    }

    /// 按声明顺序求值所有断言；前一条失败不影响后续
    pub fn evaluate(
        &self,
        suite: &str,
        request: &TestRequest,
        response: &Response,
        store: &ValueStore,
    ) -> Vec<Outcome> {
        request
            .expect
            .iter()
            .map(|expectation| {
                let Some(validator) = self.registry.lookup(&expectation.kind) else {
                    tracing::warn!(assertion = %expectation.kind, "Unknown expectation type");
                    return Outcome::fail(
                        suite,
                        &request.name,
                        &expectation.kind,
                        UNKNOWN_EXPECTATION,
                    );
                };

                let params = ParamBag::with_response(
                    &expectation.params,
                    response.status.code(),
                    &response.headers,
                );
                let ctx = ValidationContext::new(&response.body, &params).with_store(store);

                match validator.validate(&ctx) {
                    Ok(()) => {
                        tracing::debug!(assertion = %expectation.kind, "Assertion passed");
                        Outcome::pass(suite, &request.name, &expectation.kind)
                    }
                    Err(e) => {
                        tracing::debug!(assertion = %expectation.kind, error = %e, "Assertion failed");
                        Outcome::fail(suite, &request.name, &expectation.kind, e.to_string())
                    }
                }
            })
            .collect()
    }
}
