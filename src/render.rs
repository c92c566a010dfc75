//! Rendering of file plans into Go source.

use std::collections::BTreeMap;
use std::fmt::{self, Write};

use crate::http::BodyEncoding;
use crate::ident::{to_go_camel, unexport};
use crate::params::{Accessor, Condition, Operand, Statement, Value, REQUEST};
use crate::plan::{Body, CallPlan, FilePlan, MethodBody, MethodPlan, ServicePlan};
use crate::Result;

/// The generator name written into the header of generated files.
pub const GENERATOR: &str = "protoc-gen-goapi";

const GREQUESTS: &str = "github.com/open-api-go/grequests";
const PROTOJSON: &str = "google.golang.org/protobuf/encoding/protojson";

/// Renders `plan` into the contents of a Go source file.
pub fn render(plan: &FilePlan) -> Result<String> {
    let mut writer = GoWriter::default();
    writer.file(plan)?;
    Ok(writer.buf)
}

#[derive(Default)]
struct GoWriter {
    buf: String,
    depth: u8,
}

impl GoWriter {
    fn file(&mut self, plan: &FilePlan) -> Result<()> {
        writeln!(
            self.buf,
            "// Code generated by {} (version {}). DO NOT EDIT.",
            GENERATOR,
            env!("CARGO_PKG_VERSION")
        )?;
        writeln!(self.buf, "// source: {}", plan.source)?;
        self.buf.push('\n');
        writeln!(self.buf, "package {}", plan.go_package)?;

        if plan.services.is_empty() {
            return Ok(());
        }

        let has_methods = plan
            .services
            .iter()
            .any(|service| !service.methods.is_empty());
        let well_known = plan.marshals_well_known();
        let mut std_imports = Vec::new();
        if has_methods {
            std_imports.push("context");
        }
        if well_known {
            std_imports.push("encoding/json");
        }
        if has_methods {
            std_imports.push("fmt");
        }
        if plan.has_params() {
            std_imports.push("net/url");
        }

        let mut imports = BTreeMap::new();
        imports.insert(GREQUESTS, "grequests");
        if well_known {
            imports.insert(PROTOJSON, "protojson");
        }
        for (path, name) in &plan.imports {
            imports.insert(path.as_str(), name.as_str());
        }

        self.buf.push_str("\nimport (\n");
        for &path in &std_imports {
            let name = path.rsplit('/').next().unwrap_or(path);
            self.import(name, path)?;
        }
        if !std_imports.is_empty() {
            self.buf.push('\n');
        }
        for (path, name) in imports {
            self.import(name, path)?;
        }
        self.buf.push_str(")\n");

        for service in &plan.services {
            self.service(service)?;
        }
        Ok(())
    }

    fn import(&mut self, name: &str, path: &str) -> Result<()> {
        writeln!(self.buf, "\t{} {}", name, go_quote(path))?;
        Ok(())
    }

    fn service(&mut self, service: &ServicePlan) -> Result<()> {
        let name = &service.name;
        let implementation = unexport(&format!("{}Service", name));

        writeln!(self.buf, "\n// Client API for {} service\n", name)?;
        writeln!(self.buf, "type {}Service interface {{", name)?;
        for method in &service.methods {
            if !method.summary.is_empty() {
                writeln!(self.buf, "\t// {} {}", method.name, method.summary)?;
            }
            writeln!(self.buf, "\t{}", signature(method))?;
        }
        self.buf.push_str("}\n\n");

        writeln!(self.buf, "type {} struct {{", implementation)?;
        self.buf.push_str("\taddr    string\n");
        self.buf.push_str("\tsession *grequests.Session\n");
        self.buf.push_str("}\n\n");

        writeln!(
            self.buf,
            "// New{0}Service returns a {0} client sending requests to addr, e.g. \"https://example.com\".",
            name
        )?;
        writeln!(
            self.buf,
            "func New{}Service(addr string, opts ...grequests.RequestOption) {}Service {{",
            name, name
        )?;
        writeln!(self.buf, "\treturn &{}{{", implementation)?;
        self.buf.push_str("\t\taddr:    addr,\n");
        self.buf.push_str("\t\tsession: grequests.NewSession(opts...),\n");
        self.buf.push_str("\t}\n}\n");

        for method in &service.methods {
            writeln!(
                self.buf,
                "\nfunc (c *{}) {} {{",
                implementation,
                signature(method)
            )?;
            self.depth += 1;
            self.method_body(&method.body)?;
            self.depth -= 1;
            self.buf.push_str("}\n");
        }
        Ok(())
    }

    fn method_body(&mut self, body: &MethodBody) -> Result<()> {
        match body {
            MethodBody::Streaming { method, client } => {
                let kind = if *client { "client" } else { "server" };
                self.line(format_args!(
                    "return nil, fmt.Errorf(\"{} streaming method %s is not supported over REST\", {})",
                    kind,
                    go_quote(method)
                ))
            }
            MethodBody::Unbound { method } => self.line(format_args!(
                "return nil, fmt.Errorf(\"method %s has no HTTP binding\", {})",
                go_quote(method)
            )),
            MethodBody::Rest(plan) => self.call(plan),
        }
    }

    fn call(&mut self, plan: &CallPlan) -> Result<()> {
        let mut args = format!("{}, c.addr", go_quote(&format!("%s{}", plan.url.format)));
        for accessor in &plan.url.accessors {
            write!(args, ", {}", accessor)?;
        }
        self.line(format_args!("rawURL := fmt.Sprintf({})", args))?;

        if !plan.query.is_empty() {
            self.line(format_args!("params := url.Values{{}}"))?;
            self.statements(&plan.query)?;
            self.line(format_args!("opts = append(opts, grequests.Params(params))"))?;
        }

        match &plan.body {
            Body::None => {}
            Body::Json(value) => {
                self.line(format_args!("opts = append(opts, grequests.JSON({}))", value))?
            }
            Body::Form {
                encoding,
                statements,
            } => {
                let option = match encoding {
                    BodyEncoding::Multipart => "Multipart",
                    _ => "Form",
                };
                self.line(format_args!("forms := url.Values{{}}"))?;
                self.statements(statements)?;
                self.line(format_args!(
                    "opts = append(opts, grequests.{}(forms))",
                    option
                ))?;
            }
        }

        self.line(format_args!(
            "return c.session.{}(rawURL, opts...)",
            plan.dispatch()
        ))
    }

    fn statements(&mut self, statements: &[Statement]) -> Result<()> {
        for statement in statements {
            self.statement(statement)?;
        }
        Ok(())
    }

    fn statement(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Add { bucket, key, value } => match value {
                Value::Formatted(operand) => self.line(format_args!(
                    "{}.Add({}, fmt.Sprintf(\"%v\", {}))",
                    bucket.var(),
                    go_quote(key),
                    operand_expr(operand)
                )),
                Value::WellKnown { var, operand } => {
                    self.line(format_args!(
                        "{}JSON, err := protojson.Marshal({})",
                        var,
                        operand_expr(operand)
                    ))?;
                    self.return_err()?;
                    self.line(format_args!("{0}Text := string({0}JSON)", var))?;
                    self.line(format_args!(
                        "if len({0}JSON) > 0 && {0}JSON[0] == '\"' {{",
                        var
                    ))?;
                    self.depth += 1;
                    self.line(format_args!(
                        "if err := json.Unmarshal({0}JSON, &{0}Text); err != nil {{",
                        var
                    ))?;
                    self.depth += 1;
                    self.line(format_args!("return nil, err"))?;
                    self.depth -= 1;
                    self.line(format_args!("}}"))?;
                    self.depth -= 1;
                    self.line(format_args!("}}"))?;
                    self.line(format_args!(
                        "{}.Add({}, {}Text)",
                        bucket.var(),
                        go_quote(key),
                        var
                    ))
                }
            },
            Statement::If { condition, body } => {
                self.line(format_args!("if {} {{", condition_expr(condition)))?;
                self.block(body)
            }
            Statement::ForEach { items, body } => {
                self.line(format_args!("for _, item := range {} {{", items))?;
                self.block(body)
            }
        }
    }

    fn return_err(&mut self) -> Result<()> {
        self.line(format_args!("if err != nil {{"))?;
        self.depth += 1;
        self.line(format_args!("return nil, err"))?;
        self.depth -= 1;
        self.line(format_args!("}}"))
    }

    fn block(&mut self, body: &[Statement]) -> Result<()> {
        self.depth += 1;
        self.statements(body)?;
        self.depth -= 1;
        self.line(format_args!("}}"))
    }

    fn line(&mut self, line: fmt::Arguments<'_>) -> Result<()> {
        self.push_indent();
        self.buf.write_fmt(line)?;
        self.buf.push('\n');
        Ok(())
    }

    fn push_indent(&mut self) {
        for _ in 0..self.depth {
            self.buf.push('\t');
        }
    }
}

fn signature(method: &MethodPlan) -> String {
    format!(
        "{}(ctx context.Context, {} *{}, opts ...grequests.RequestOption) (*grequests.Response, error)",
        method.name, REQUEST, method.input_type
    )
}

fn operand_expr(operand: &Operand) -> String {
    match operand {
        Operand::Field(accessor) => accessor.to_string(),
        Operand::Item => "item".to_owned(),
    }
}

fn condition_expr(condition: &Condition) -> String {
    match condition {
        Condition::NonEmpty(accessor) => format!("len({}) > 0", accessor),
        Condition::Present(accessor) => presence(accessor),
        Condition::NonNil(accessor) => format!("{} != nil", accessor),
        Condition::NonEmptyString(accessor) => format!("{} != \"\"", accessor),
        Condition::True(accessor) => accessor.to_string(),
        Condition::NonZero(accessor) => format!("{} != 0", accessor),
    }
}

/// The presence check of a proto3 `optional` field reads the field's pointer directly, which
/// requires the holding message to be non-nil.
fn presence(accessor: &Accessor) -> String {
    let parent = accessor.parent().unwrap_or_default();
    let field = to_go_camel(accessor.last().unwrap_or_default());
    format!("{0} != nil && {0}.{1} != nil", parent, field)
}

/// Quotes `s` as a Go interpreted string literal.
fn go_quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(quoted, "\\u{:04x}", c as u32);
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
