//! Process handler port
//!
//! A process handler carries the business rule for one (object type,
//! operation) pair. It receives a [`HandlerContext`] holding the resolved
//! call context and may call back into the dispatcher, the configuration,
//! or the raw controller primitives for its own type.

use serde_json::{Map, Value};

use crate::application::context::{CallContext, Params};
use crate::application::dispatcher::{Dispatcher, Request};
use crate::domain::entities::{ObjectList, ResolvedObject};
use crate::domain::value_objects::{IntoKeyPath, KeyPath, Operation};
use crate::error::TesseraResult;

/// What a handler hands back; must fit the operation.
///
/// | operation | accepted               |
/// |-----------|------------------------|
/// | create    | `Object`               |
/// | update    | `Object`               |
/// | get       | `Object` or `Absent`   |
/// | query     | `List`                 |
/// | delete    | `Deleted`              |
#[derive(Debug, Clone)]
pub enum HandlerOutput {
    Object(ResolvedObject),
    Absent,
    List(ObjectList),
    Deleted(bool),
}

impl HandlerOutput {
    pub fn kind(&self) -> &'static str {
        match self {
            HandlerOutput::Object(_) => "an object",
            HandlerOutput::Absent => "no object",
            HandlerOutput::List(_) => "a list",
            HandlerOutput::Deleted(_) => "a deletion status",
        }
    }

    pub(crate) fn fits(&self, operation: Operation) -> bool {
        matches!(
            (operation, self),
            (Operation::Create | Operation::Update, HandlerOutput::Object(_))
                | (Operation::Get, HandlerOutput::Object(_) | HandlerOutput::Absent)
                | (Operation::Query, HandlerOutput::List(_))
                | (Operation::Delete, HandlerOutput::Deleted(_))
        )
    }
}

impl From<ResolvedObject> for HandlerOutput {
    fn from(object: ResolvedObject) -> Self {
        HandlerOutput::Object(object)
    }
}

impl From<Option<ResolvedObject>> for HandlerOutput {
    fn from(object: Option<ResolvedObject>) -> Self {
        object.map_or(HandlerOutput::Absent, HandlerOutput::Object)
    }
}

impl From<ObjectList> for HandlerOutput {
    fn from(list: ObjectList) -> Self {
        HandlerOutput::List(list)
    }
}

pub trait ProcessHandler: Send + Sync {
    fn call(&self, ctx: &mut HandlerContext<'_>) -> anyhow::Result<HandlerOutput>;
}

impl<F> ProcessHandler for F
where
    F: Fn(&mut HandlerContext<'_>) -> anyhow::Result<HandlerOutput> + Send + Sync,
{
    fn call(&self, ctx: &mut HandlerContext<'_>) -> anyhow::Result<HandlerOutput> {
        self(ctx)
    }
}

pub struct HandlerContext<'a> {
    dispatcher: &'a Dispatcher,
    request: &'a mut Request,
    call: CallContext,
}

impl<'a> HandlerContext<'a> {
    pub(crate) fn new(dispatcher: &'a Dispatcher, request: &'a mut Request, call: CallContext) -> Self {
        Self {
            dispatcher,
            request,
            call,
        }
    }

    pub fn object_type(&self) -> &str {
        self.call.object_type()
    }

    pub fn operation(&self) -> Operation {
        self.call.operation()
    }

    /// Resolved call context (data, dependency objects, backend payload).
    pub fn context(&self) -> &CallContext {
        &self.call
    }

    /// Context value for a key path such as `student_name` or `router/id`.
    pub fn value(&self, key: impl IntoKeyPath) -> TesseraResult<Option<Value>> {
        let key: KeyPath = key.into_key_path()?;
        Ok(self.call.get(&key))
    }

    pub fn object(&self, object_type: &str) -> Option<&ResolvedObject> {
        self.call.object(object_type)
    }

    // ---- dispatcher callbacks ----

    pub fn create(
        &mut self,
        object_type: &str,
        params: impl Into<Params>,
    ) -> TesseraResult<ResolvedObject> {
        self.dispatcher
            .create_within(self.request, object_type, params.into())
    }

    pub fn get_object(
        &mut self,
        object_type: &str,
        id: &str,
        params: impl Into<Params>,
    ) -> TesseraResult<Option<ResolvedObject>> {
        self.dispatcher
            .get_within(self.request, object_type, id, params.into())
    }

    pub fn query(
        &mut self,
        object_type: &str,
        filter: Value,
        params: impl Into<Params>,
    ) -> TesseraResult<ObjectList> {
        self.dispatcher
            .query_within(self.request, object_type, filter, params.into())
    }

    /// First match of a query; logs a warning when several match.
    pub fn query_single(
        &mut self,
        object_type: &str,
        filter: Value,
        params: impl Into<Params>,
    ) -> TesseraResult<Option<ResolvedObject>> {
        let list = self.query(object_type, filter, params)?;
        Ok(Dispatcher::single(list))
    }

    pub fn update(
        &mut self,
        object: &ResolvedObject,
        params: impl Into<Params>,
    ) -> TesseraResult<ResolvedObject> {
        self.dispatcher
            .update_within(self.request, object, params.into())
    }

    pub fn delete(&mut self, object: &ResolvedObject, params: impl Into<Params>) -> TesseraResult<bool> {
        self.dispatcher
            .delete_within(self.request, object, params.into())
    }

    // ---- configuration ----

    pub fn config_get(&self, key: impl IntoKeyPath) -> TesseraResult<Option<Value>> {
        self.dispatcher.config_read().get(key)
    }

    pub fn config_set(
        &self,
        key: impl IntoKeyPath,
        value: impl Into<Value>,
    ) -> TesseraResult<Option<Value>> {
        self.dispatcher.config_write().set(key, value)
    }

    // ---- controller primitives for this handler's type ----

    /// Controller `create` with the call's backend payload.
    pub fn controller_create(&self) -> TesseraResult<ResolvedObject> {
        self.dispatcher
            .controller_create(self.object_type(), self.call.hdata())
    }

    /// Controller `query` with a process-side filter; soft-delete applies.
    pub fn controller_query(&self, filter: &Map<String, Value>) -> TesseraResult<ObjectList> {
        self.dispatcher
            .controller_query(self.object_type(), filter, self.call.hdata())
    }

    pub fn controller_get(&self, id: &str) -> TesseraResult<Option<ResolvedObject>> {
        self.dispatcher
            .controller_get(self.object_type(), id, self.call.hdata())
    }

    /// Push `object`'s current state through controller `update`.
    pub fn controller_update(&self, object: &ResolvedObject) -> TesseraResult<ResolvedObject> {
        self.dispatcher.controller_update(object, self.call.hdata())
    }

    pub fn controller_delete(&self, object: &ResolvedObject) -> TesseraResult<bool> {
        self.dispatcher.controller_delete(object, self.call.hdata())
    }
}
