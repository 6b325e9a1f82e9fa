//! Dispatcher
//!
//! Runs create/get/query/update/delete requests on declared object types:
//!
//! 1. Resolve the dependencies declared for the operation, recursing into
//!    object dependencies depth first
//! 2. Build the call context and the backend payload (`hdata`)
//! 3. Run the bound process handler, or the controller primitive
//! 4. Wrap native results into [`ResolvedObject`]s with the type's mapping
//!
//! Object dependencies resolved during one outer request are cached in the
//! request's working set and reused by every later dependent.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::application::context::{CallContext, Params};
use crate::application::handler::{HandlerContext, HandlerOutput};
use crate::application::schema::{
    ControllerMapping, HandlerBinding, Need, NeedKind, ObjectTypeDeclaration, Schema,
};
use crate::domain::entities::{ConfigLayer, ObjectList, ResolvedObject, Tree};
use crate::domain::ports::{Controller, ControllerError};
use crate::domain::services::{
    LayerStack, MetadataModel, MetadataPolicy, SharedConfig, SharedMetadata,
};
use crate::domain::value_objects::{KeyPath, Operation};
use crate::error::{ErrorKind, TesseraError, TesseraResult};
use crate::settings::DispatchSettings;

/// Per-request state shared by every nested resolution.
#[derive(Debug, Default)]
pub(crate) struct Request {
    working_set: HashMap<String, ResolvedObject>,
    resolving: Vec<String>,
}

enum Call {
    Create,
    Get(String),
    Query(Map<String, Value>),
    Update,
    Delete,
}

impl Call {
    fn operation(&self) -> Operation {
        match self {
            Call::Create => Operation::Create,
            Call::Get(_) => Operation::Get,
            Call::Query(_) => Operation::Query,
            Call::Update => Operation::Update,
            Call::Delete => Operation::Delete,
        }
    }
}

pub struct Dispatcher {
    schema: Arc<Schema>,
    controller: Arc<dyn Controller>,
    config: SharedConfig,
    metadata: SharedMetadata,
    auto_create: bool,
    /// `config` is the built-in runtime stack, policed by `metadata`.
    owns_config: bool,
}

impl Dispatcher {
    /// Dispatcher with a single writable `runtime` config layer.
    pub fn new(schema: Arc<Schema>, controller: Arc<dyn Controller>) -> Self {
        let metadata = MetadataModel::new(schema.app().clone()).into_shared();
        let mut stack =
            LayerStack::new().with_policy(Arc::new(MetadataPolicy::new(Arc::clone(&metadata))));
        // first layer of an empty stack
        let _ = stack.push_layer(ConfigLayer::new("runtime").writable());

        Self {
            schema,
            controller,
            config: stack.into_shared(),
            metadata,
            auto_create: true,
            owns_config: true,
        }
    }

    pub fn with_config(mut self, config: SharedConfig) -> Self {
        self.config = config;
        self.owns_config = false;
        self
    }

    /// Replace the metadata model. The built-in runtime stack is re-policed
    /// by it; a stack passed to [`Self::with_config`] keeps its own policy.
    pub fn with_metadata(mut self, metadata: SharedMetadata) -> Self {
        if self.owns_config {
            self.config_write()
                .set_policy(Arc::new(MetadataPolicy::new(Arc::clone(&metadata))));
        }
        self.metadata = metadata;
        self
    }

    /// Merge controller mappings into the `controller` metadata layer.
    pub fn with_controller_mapping(self, mapping: ControllerMapping) -> Self {
        self.metadata_write().merge_controller(&mapping.into_tree());
        self
    }

    /// Create missing required object dependencies (on by default).
    pub fn with_auto_create(mut self, enabled: bool) -> Self {
        self.auto_create = enabled;
        self
    }

    /// Apply the `[dispatch]` settings.
    pub fn with_settings(self, settings: &DispatchSettings) -> Self {
        self.with_auto_create(settings.auto_create_dependencies)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    pub fn metadata(&self) -> &SharedMetadata {
        &self.metadata
    }

    pub fn controller(&self) -> &Arc<dyn Controller> {
        &self.controller
    }

    pub(crate) fn config_read(&self) -> RwLockReadGuard<'_, LayerStack> {
        self.config.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn config_write(&self) -> RwLockWriteGuard<'_, LayerStack> {
        self.config.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn metadata_read(&self) -> RwLockReadGuard<'_, MetadataModel> {
        self.metadata.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn metadata_write(&self) -> RwLockWriteGuard<'_, MetadataModel> {
        self.metadata.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ---- public requests ----

    pub fn create(
        &self,
        object_type: &str,
        params: impl Into<Params>,
    ) -> TesseraResult<ResolvedObject> {
        self.create_within(&mut Request::default(), object_type, params.into())
    }

    pub fn get(
        &self,
        object_type: &str,
        id: &str,
        params: impl Into<Params>,
    ) -> TesseraResult<Option<ResolvedObject>> {
        self.get_within(&mut Request::default(), object_type, id, params.into())
    }

    /// Objects whose mapped attributes equal every `filter` pair.
    ///
    /// A `null` filter matches everything; other non-object filters are
    /// rejected with [`TesseraError::InvalidFilter`].
    pub fn query(
        &self,
        object_type: &str,
        filter: Value,
        params: impl Into<Params>,
    ) -> TesseraResult<ObjectList> {
        self.query_within(&mut Request::default(), object_type, filter, params.into())
    }

    /// First query match; logs a warning when several match.
    pub fn query_single(
        &self,
        object_type: &str,
        filter: Value,
        params: impl Into<Params>,
    ) -> TesseraResult<Option<ResolvedObject>> {
        let list = self.query(object_type, filter, params)?;
        Ok(Self::single(list))
    }

    pub fn update(
        &self,
        object: &ResolvedObject,
        params: impl Into<Params>,
    ) -> TesseraResult<ResolvedObject> {
        self.update_within(&mut Request::default(), object, params.into())
    }

    pub fn delete(&self, object: &ResolvedObject, params: impl Into<Params>) -> TesseraResult<bool> {
        self.delete_within(&mut Request::default(), object, params.into())
    }

    pub(crate) fn single(list: ObjectList) -> Option<ResolvedObject> {
        if list.len() > 1 {
            warn!(
                object_type = list.object_type(),
                matches = list.len(),
                "query matched several objects, using the first"
            );
        }
        list.into_vec().into_iter().next()
    }

    // ---- requests sharing a working set (handler callbacks) ----

    pub(crate) fn create_within(
        &self,
        request: &mut Request,
        object_type: &str,
        params: Params,
    ) -> TesseraResult<ResolvedObject> {
        match self.callback(request, object_type, Call::Create, params)? {
            HandlerOutput::Object(object) => Ok(object),
            other => Err(invalid_result(object_type, Operation::Create, &other)),
        }
    }

    pub(crate) fn get_within(
        &self,
        request: &mut Request,
        object_type: &str,
        id: &str,
        params: Params,
    ) -> TesseraResult<Option<ResolvedObject>> {
        match self.callback(request, object_type, Call::Get(id.to_string()), params)? {
            HandlerOutput::Object(object) => Ok(Some(object)),
            HandlerOutput::Absent => Ok(None),
            other => Err(invalid_result(object_type, Operation::Get, &other)),
        }
    }

    pub(crate) fn query_within(
        &self,
        request: &mut Request,
        object_type: &str,
        filter: Value,
        params: Params,
    ) -> TesseraResult<ObjectList> {
        let filter = match filter {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(TesseraError::InvalidFilter {
                    object_type: object_type.to_string(),
                    found: value_kind(&other),
                })
            }
        };
        match self.callback(request, object_type, Call::Query(filter), params)? {
            HandlerOutput::List(list) => Ok(list),
            other => Err(invalid_result(object_type, Operation::Query, &other)),
        }
    }

    pub(crate) fn update_within(
        &self,
        request: &mut Request,
        object: &ResolvedObject,
        params: Params,
    ) -> TesseraResult<ResolvedObject> {
        let object_type = object.object_type().to_string();
        let params = params.with_object(object.clone());
        match self.callback(request, &object_type, Call::Update, params)? {
            HandlerOutput::Object(object) => Ok(object),
            other => Err(invalid_result(&object_type, Operation::Update, &other)),
        }
    }

    pub(crate) fn delete_within(
        &self,
        request: &mut Request,
        object: &ResolvedObject,
        params: Params,
    ) -> TesseraResult<bool> {
        let object_type = object.object_type().to_string();
        let params = params.with_object(object.clone());
        match self.callback(request, &object_type, Call::Delete, params)? {
            HandlerOutput::Deleted(done) => {
                if done {
                    request
                        .working_set
                        .retain(|_, cached| !cached.same_instance(object));
                }
                Ok(done)
            }
            other => Err(invalid_result(&object_type, Operation::Delete, &other)),
        }
    }

    /// Run a request outside the dependency chain of the current one.
    ///
    /// Handler callbacks may legitimately target their own type.
    fn callback(
        &self,
        request: &mut Request,
        object_type: &str,
        call: Call,
        params: Params,
    ) -> TesseraResult<HandlerOutput> {
        let saved = std::mem::take(&mut request.resolving);
        let result = self.run(request, object_type, call, params);
        request.resolving = saved;
        result
    }

    // ---- resolution ----

    fn run(
        &self,
        request: &mut Request,
        object_type: &str,
        call: Call,
        params: Params,
    ) -> TesseraResult<HandlerOutput> {
        let decl = self.schema.object_type(object_type)?;
        let operation = call.operation();

        if request.resolving.iter().any(|t| t == object_type) {
            let mut chain = request.resolving.clone();
            chain.push(object_type.to_string());
            return Err(TesseraError::DependencyCycle { chain });
        }

        request.resolving.push(object_type.to_string());
        let result = self.run_declared(request, decl, call, params);
        request.resolving.pop();

        if let Err(e) = &result {
            debug!(object_type, operation = %operation, error = %e, "request failed");
        }
        result
    }

    fn run_declared(
        &self,
        request: &mut Request,
        decl: &ObjectTypeDeclaration,
        call: Call,
        params: Params,
    ) -> TesseraResult<HandlerOutput> {
        let object_type = decl.name();
        let operation = call.operation();
        debug!(object_type, operation = %operation, "resolving dependencies");

        let mut ctx = CallContext::new(object_type, operation, params);
        self.resolve_needs(request, decl, &mut ctx)?;

        match call {
            Call::Create => {}
            Call::Get(id) => ctx.id = Some(id),
            Call::Query(filter) => ctx.filter = filter,
            Call::Update | Call::Delete => ctx.target = Some(self.target_of(request, &ctx)?),
        }
        ctx.hdata = self.build_hdata(&ctx);

        let output = match decl.binding(operation) {
            Some(HandlerBinding::Process(handler)) => {
                debug!(object_type, operation = %operation, "dispatching to process handler");
                let mut handler_ctx = HandlerContext::new(self, request, ctx);
                handler
                    .call(&mut handler_ctx)
                    .map_err(|e| handler_error(object_type, operation, e))?
            }
            Some(HandlerBinding::Controller) => {
                debug!(object_type, operation = %operation, "dispatching to controller");
                self.controller_call(&ctx)?
            }
            None => {
                return Err(TesseraError::UnboundOperation {
                    object_type: object_type.to_string(),
                    operation,
                })
            }
        };

        if !output.fits(operation) {
            return Err(invalid_result(object_type, operation, &output));
        }
        Ok(output)
    }

    fn resolve_needs(
        &self,
        request: &mut Request,
        decl: &ObjectTypeDeclaration,
        ctx: &mut CallContext,
    ) -> TesseraResult<()> {
        let operation = ctx.operation;
        for need in decl.needs_for(operation) {
            match need.kind {
                NeedKind::Data => {
                    // an explicit null counts as not passed
                    match ctx.params.get(&need.name) {
                        Some(Value::Null) => {
                            ctx.params.remove(&need.name);
                        }
                        Some(_) => continue,
                        None => {}
                    }
                    match self.data_value(need)? {
                        Some(value) => {
                            ctx.data.insert(need.name.clone(), value);
                        }
                        None if need.required => {
                            return Err(missing(decl.name(), operation, &need.name, None));
                        }
                        None => debug!(dependency = %need.name, "optional data omitted"),
                    }
                }
                NeedKind::Object => match self.resolve_object(request, decl, ctx, need)? {
                    Some(object) => {
                        ctx.objects.insert(need.name.clone(), object);
                    }
                    None => debug!(dependency = %need.name, "optional object omitted"),
                },
            }
        }
        Ok(())
    }

    /// Configuration, else declared default, else metadata default.
    fn data_value(&self, need: &Need) -> TesseraResult<Option<Value>> {
        let key = KeyPath::parse(&need.name)?;
        if let Some(value) = self.config_read().get(&key)? {
            return Ok(Some(value));
        }
        if let Some(value) = &need.default {
            return Ok(Some(value.clone()));
        }
        Ok(self.metadata_read().default_value(&key))
    }

    /// Parameter object, working set, known id, then creation (required only).
    fn resolve_object(
        &self,
        request: &mut Request,
        decl: &ObjectTypeDeclaration,
        ctx: &CallContext,
        need: &Need,
    ) -> TesseraResult<Option<ResolvedObject>> {
        let dep = need.name.as_str();
        let operation = ctx.operation;

        if let Some(object) = ctx.params.object(dep) {
            request.working_set.insert(dep.to_string(), object.clone());
            return Ok(Some(object.clone()));
        }
        if let Some(object) = request.working_set.get(dep) {
            debug!(dependency = dep, "reusing object from working set");
            return Ok(Some(object.clone()));
        }

        if let Some(id) = self.known_id(ctx, dep)? {
            debug!(dependency = dep, id = %id, "fetching dependency by id");
            match self.run(request, dep, Call::Get(id.clone()), ctx.params.clone())? {
                HandlerOutput::Object(object) => {
                    request.working_set.insert(dep.to_string(), object.clone());
                    return Ok(Some(object));
                }
                _ => warn!(dependency = dep, id = %id, "known id not found"),
            }
        }

        if !need.required {
            return Ok(None);
        }
        if !self.auto_create {
            return Err(missing(decl.name(), operation, dep, None));
        }

        debug!(dependency = dep, "creating missing dependency");
        match self.run(request, dep, Call::Create, ctx.params.clone()) {
            Ok(HandlerOutput::Object(object)) => {
                request.working_set.insert(dep.to_string(), object.clone());
                Ok(Some(object))
            }
            Ok(other) => Err(invalid_result(dep, Operation::Create, &other)),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::MissingRequiredDependency | ErrorKind::UnboundOperation
                ) =>
            {
                Err(missing(decl.name(), operation, dep, Some(e)))
            }
            Err(e) => Err(e),
        }
    }

    /// `<type>_id` from parameters, then configuration.
    fn known_id(&self, ctx: &CallContext, object_type: &str) -> TesseraResult<Option<String>> {
        let name = format!("{object_type}_id");
        let value = match ctx.params.get(&name) {
            Some(value) => Some(value.clone()),
            None => self.config_read().get(KeyPath::new([name.as_str()])?)?,
        };
        Ok(value.and_then(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }))
    }

    fn target_of(&self, request: &Request, ctx: &CallContext) -> TesseraResult<ResolvedObject> {
        ctx.params
            .object(&ctx.object_type)
            .or_else(|| request.working_set.get(&ctx.object_type))
            .cloned()
            .ok_or_else(|| missing(&ctx.object_type, ctx.operation, &ctx.object_type, None))
    }

    /// Backend payload: declared `hdata` entries, or every context value
    /// translated through the type's mapping when none are declared.
    fn build_hdata(&self, ctx: &CallContext) -> Map<String, Value> {
        let metadata = self.metadata_read();
        let mapping = metadata.type_mapping(&ctx.object_type);
        let entries = metadata.hdata(&ctx.object_type);
        drop(metadata);

        let mut out = Tree::new();
        if entries.is_empty() {
            for (attr, value) in ctx.values() {
                if mapping.is_undefined(&attr) {
                    continue;
                }
                let value = mapping.to_backend_value(&attr, value);
                out.set(&mapping.backend_path(&attr), value);
            }
            return out.into_map();
        }

        for entry in entries {
            let Ok(source) = KeyPath::new(entry.source.iter().map(String::as_str)) else {
                continue;
            };
            if let Some(value) = ctx.get(&source) {
                let value = if source.is_single() {
                    mapping.to_backend_value(source.head(), value)
                } else {
                    value
                };
                out.set(&entry.target, value);
            }
        }
        out.into_map()
    }

    // ---- controller primitives ----

    fn controller_call(&self, ctx: &CallContext) -> TesseraResult<HandlerOutput> {
        let object_type = ctx.object_type.as_str();
        match ctx.operation {
            Operation::Create => self
                .controller_create(object_type, &ctx.hdata)
                .map(HandlerOutput::Object),
            Operation::Get => {
                let id = ctx.id.as_deref().unwrap_or_default();
                self.controller_get(object_type, id, &ctx.hdata)
                    .map(HandlerOutput::from)
            }
            Operation::Query => self
                .controller_query(object_type, &ctx.filter, &ctx.hdata)
                .map(HandlerOutput::List),
            Operation::Update | Operation::Delete => {
                let target = ctx
                    .target
                    .as_ref()
                    .ok_or_else(|| missing(object_type, ctx.operation, object_type, None))?;
                if ctx.operation == Operation::Update {
                    self.controller_update(target, &ctx.hdata)
                        .map(HandlerOutput::Object)
                } else {
                    self.controller_delete(target, &ctx.hdata)
                        .map(HandlerOutput::Deleted)
                }
            }
        }
    }

    fn wrap(&self, object_type: &str, native: Value) -> ResolvedObject {
        let mapping = Arc::new(self.metadata_read().type_mapping(object_type));
        ResolvedObject::new(native, mapping, Arc::clone(&self.controller))
    }

    pub(crate) fn controller_create(
        &self,
        object_type: &str,
        hdata: &Map<String, Value>,
    ) -> TesseraResult<ResolvedObject> {
        let native = self
            .controller
            .create(object_type, hdata)
            .map_err(|e| backend_error(object_type, Operation::Create, e))?;
        debug!(object_type, "controller create done");
        Ok(self.wrap(object_type, native))
    }

    pub(crate) fn controller_get(
        &self,
        object_type: &str,
        id: &str,
        hdata: &Map<String, Value>,
    ) -> TesseraResult<Option<ResolvedObject>> {
        let native = self
            .controller
            .get(object_type, id, hdata)
            .map_err(|e| backend_error(object_type, Operation::Get, e))?;
        Ok(native.map(|n| self.wrap(object_type, n)))
    }

    pub(crate) fn controller_query(
        &self,
        object_type: &str,
        filter: &Map<String, Value>,
        hdata: &Map<String, Value>,
    ) -> TesseraResult<ObjectList> {
        let mapping = self.metadata_read().type_mapping(object_type);
        let mut backend_filter = Tree::new();
        for (attr, value) in filter {
            if mapping.is_undefined(attr) {
                continue;
            }
            backend_filter.set(
                &mapping.backend_path(attr),
                mapping.to_backend_value(attr, value.clone()),
            );
        }

        let natives = self
            .controller
            .query(object_type, backend_filter.as_map(), hdata)
            .map_err(|e| backend_error(object_type, Operation::Query, e))?;

        let soft_delete = self
            .schema
            .object_type(object_type)
            .ok()
            .and_then(|d| d.soft_delete().cloned())
            .filter(|sd| !filter.contains_key(&sd.attribute));

        let items: Vec<ResolvedObject> = natives
            .into_iter()
            .map(|native| self.wrap(object_type, native))
            .filter(|object| object.matches(filter))
            .filter(|object| match &soft_delete {
                Some(sd) => object
                    .get(&sd.attribute)
                    .is_none_or(|status| status == sd.active),
                None => true,
            })
            .collect();

        debug!(object_type, matches = items.len(), "controller query done");
        Ok(ObjectList::new(object_type, filter.clone(), items))
    }

    pub(crate) fn controller_update(
        &self,
        object: &ResolvedObject,
        hdata: &Map<String, Value>,
    ) -> TesseraResult<ResolvedObject> {
        let object_type = object.object_type();
        let native = self
            .controller
            .update(object_type, &object.native(), hdata)
            .map_err(|e| backend_error(object_type, Operation::Update, e))?;
        object.replace_native(native);
        Ok(object.clone())
    }

    pub(crate) fn controller_delete(
        &self,
        object: &ResolvedObject,
        hdata: &Map<String, Value>,
    ) -> TesseraResult<bool> {
        let object_type = object.object_type();
        let mut payload = hdata.clone();
        if let Some(id) = object.id() {
            payload.insert("id".to_string(), Value::String(id));
        }
        self.controller
            .delete(object_type, &payload)
            .map_err(|e| backend_error(object_type, Operation::Delete, e))
    }
}

fn missing(
    object_type: &str,
    operation: Operation,
    dependency: &str,
    cause: Option<TesseraError>,
) -> TesseraError {
    TesseraError::MissingRequiredDependency {
        object_type: object_type.to_string(),
        operation,
        dependency: dependency.to_string(),
        cause: cause.map(Box::new),
    }
}

fn invalid_result(object_type: &str, operation: Operation, output: &HandlerOutput) -> TesseraError {
    TesseraError::InvalidHandlerResult {
        object_type: object_type.to_string(),
        operation,
        returned: output.kind(),
    }
}

fn backend_error(object_type: &str, operation: Operation, error: ControllerError) -> TesseraError {
    match error {
        ControllerError::Unsupported { .. } => TesseraError::UnboundOperation {
            object_type: object_type.to_string(),
            operation,
        },
        source => TesseraError::Backend {
            object_type: object_type.to_string(),
            operation,
            source,
        },
    }
}

/// Crate errors raised inside a handler pass through unchanged.
fn handler_error(object_type: &str, operation: Operation, error: anyhow::Error) -> TesseraError {
    match error.downcast::<TesseraError>() {
        Ok(inner) => inner,
        Err(error) => TesseraError::handler(object_type, operation, error),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
