//! HTML form handling
//!
//! Submissions are parsed into plain structs, validated into domain types,
//! and on failure re-rendered through a [`FormView`] that carries the
//! submitted values and per-field messages.

use std::collections::BTreeMap;

use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Form;
use serde::{Deserialize, Serialize};

use super::error::AppError;
use crate::db::{Group, PostCard};
use crate::media::ImageKind;
use crate::models::{CommentText, Password, PostText, Username, ValidationError};

pub const MSG_REQUIRED: &str = "Обязательное поле.";
pub const MSG_INVALID_CHOICE: &str =
    "Выберите корректный вариант. Вашего варианта нет среди допустимых значений.";
pub const MSG_INVALID_IMAGE: &str = "Загрузите правильное изображение. Файл, который вы загрузили, поврежден или не является изображением.";
pub const MSG_IMAGE_CONTRADICTION: &str =
    "Пожалуйста, загрузите файл или поставьте флажок \"Очистить\", но не оба.";
pub const MSG_BAD_CREDENTIALS: &str = "Пожалуйста, введите правильные имя пользователя и пароль. Оба поля могут быть чувствительны к регистру.";
pub const MSG_USERNAME_TAKEN: &str = "Пользователь с таким именем уже существует.";
pub const MSG_WRONG_OLD_PASSWORD: &str =
    "Ваш старый пароль введен неправильно. Пожалуйста, введите его снова.";

/// Russian message for a failed field.
pub fn message_for(err: &ValidationError) -> String {
    match err {
        ValidationError::Empty { .. } => MSG_REQUIRED.to_owned(),
        ValidationError::TooLong { max, .. } => {
            format!("Убедитесь, что это значение содержит не более {max} символов.")
        }
        ValidationError::TooShort { field: "password", min } => format!(
            "Введённый пароль слишком короткий. Он должен содержать как минимум {min} символов."
        ),
        ValidationError::TooShort { min, .. } => {
            format!("Убедитесь, что это значение содержит не менее {min} символов.")
        }
        ValidationError::InvalidFormat { field: "username", .. } => "Введите правильное имя пользователя. Оно может содержать только буквы, цифры и знаки @/./+/-/_.".to_owned(),
        ValidationError::InvalidFormat { field: "password", .. } => {
            "Введённый пароль состоит только из цифр.".to_owned()
        }
        ValidationError::InvalidFormat { .. } => "Введите правильное значение.".to_owned(),
        ValidationError::Reserved { .. } => "Это имя пользователя недоступно.".to_owned(),
        ValidationError::Mismatch { .. } => "Введенные пароли не совпадают.".to_owned(),
    }
}

/// Per-field error messages, plus `__all__` for form-wide ones
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub const NON_FIELD: &'static str = "__all__";

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn add_validation(&mut self, field: &'static str, err: &ValidationError) {
        self.add(field, message_for(err));
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(value)` if nothing was recorded.
    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

/// One option of a `<select>`
#[derive(Debug, Clone, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// A field as the templates render it
#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub help_text: &'static str,
    pub widget: &'static str,
    pub required: bool,
    pub value: String,
    pub choices: Vec<Choice>,
    pub errors: Vec<String>,
}

impl FormField {
    fn new(name: &'static str, label: &'static str, widget: &'static str) -> Self {
        Self {
            name,
            label,
            help_text: "",
            widget,
            required: true,
            value: String::new(),
            choices: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, "text")
    }

    pub fn email(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, "email")
    }

    pub fn password(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, "password")
    }

    pub fn textarea(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, "textarea")
    }

    pub fn select(name: &'static str, label: &'static str, choices: Vec<Choice>) -> Self {
        Self {
            choices,
            ..Self::new(name, label, "select")
        }
    }

    pub fn file(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, "file")
    }

    pub fn help(mut self, help_text: &'static str) -> Self {
        self.help_text = help_text;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = value.to_owned();
        self
    }
}

/// A whole form as the templates render it
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormView {
    pub fields: Vec<FormField>,
    pub non_field_errors: Vec<String>,
    pub is_bound: bool,
    pub multipart: bool,
}

impl FormView {
    pub fn unbound(fields: Vec<FormField>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// Attach submitted errors to their fields.
    pub fn bound(mut fields: Vec<FormField>, errors: &FormErrors) -> Self {
        for field in &mut fields {
            field.errors = errors.get(field.name).to_vec();
        }
        Self {
            fields,
            non_field_errors: errors.get(FormErrors::NON_FIELD).to_vec(),
            is_bound: true,
            multipart: false,
        }
    }

    pub fn multipart(mut self) -> Self {
        self.multipart = true;
        self
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// ---------------------------------------------------------------------------
// Post form
// ---------------------------------------------------------------------------

/// An uploaded file
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Raw post form submission, multipart or urlencoded
#[derive(Debug, Clone, Default)]
pub struct PostSubmission {
    pub text: String,
    pub group: String,
    pub image: Option<Upload>,
    pub image_clear: bool,
}

#[derive(Deserialize)]
struct PostFields {
    #[serde(default)]
    text: String,
    #[serde(default)]
    group: String,
    #[serde(default, rename = "image-clear")]
    image_clear: Option<String>,
}

impl<S> FromRequest<S> for PostSubmission
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(fields) = Form::<PostFields>::from_request(req, state)
                .await
                .map_err(AppError::bad_request)?;
            return Ok(Self {
                text: fields.text,
                group: fields.group,
                image: None,
                image_clear: fields.image_clear.is_some(),
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(AppError::bad_request)?;

        let mut submission = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(AppError::bad_request)? {
            let name = field.name().unwrap_or_default().to_owned();
            match name.as_str() {
                "text" => submission.text = field.text().await.map_err(AppError::bad_request)?,
                "group" => submission.group = field.text().await.map_err(AppError::bad_request)?,
                "image-clear" => submission.image_clear = true,
                "image" => {
                    let filename = field.file_name().unwrap_or_default().to_owned();
                    let bytes = field.bytes().await.map_err(AppError::bad_request)?;
                    // An empty file input still sends a part
                    if !bytes.is_empty() || !filename.is_empty() {
                        submission.image = Some(Upload {
                            filename,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(submission)
    }
}

/// A post form that passed validation
#[derive(Debug, Clone)]
pub struct ValidPost {
    pub text: PostText,
    pub group_id: Option<i64>,
    pub image: Option<(ImageKind, Vec<u8>)>,
    pub image_clear: bool,
}

impl PostSubmission {
    pub fn validate(&self, groups: &[Group]) -> Result<ValidPost, FormErrors> {
        let mut errors = FormErrors::default();

        let text = PostText::new(&self.text)
            .map_err(|e| errors.add_validation("text", &e))
            .ok();

        let group_id = match self.group.trim() {
            "" => None,
            raw => match raw.parse::<i64>() {
                Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
                _ => {
                    errors.add("group", MSG_INVALID_CHOICE);
                    None
                }
            },
        };

        let image = match &self.image {
            Some(_) if self.image_clear => {
                errors.add("image", MSG_IMAGE_CONTRADICTION);
                None
            }
            Some(upload) => match ImageKind::sniff(&upload.bytes) {
                Some(kind) => Some((kind, upload.bytes.clone())),
                None => {
                    errors.add("image", MSG_INVALID_IMAGE);
                    None
                }
            },
            None => None,
        };

        match text {
            Some(text) if errors.is_empty() => Ok(ValidPost {
                text,
                group_id,
                image,
                image_clear: self.image_clear,
            }),
            _ => Err(errors),
        }
    }
}

/// Values shown in the post form
#[derive(Debug, Clone, Default)]
pub struct PostFormValues {
    pub text: String,
    pub group: Option<i64>,
    pub current_image: Option<String>,
}

impl From<&PostCard> for PostFormValues {
    fn from(post: &PostCard) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group.as_ref().map(|g| g.id),
            current_image: post.image.clone(),
        }
    }
}

impl From<&PostSubmission> for PostFormValues {
    fn from(submission: &PostSubmission) -> Self {
        Self {
            text: submission.text.clone(),
            group: submission.group.trim().parse().ok(),
            current_image: None,
        }
    }
}

pub fn post_fields(groups: &[Group], values: &PostFormValues) -> Vec<FormField> {
    let mut choices = vec![Choice {
        value: String::new(),
        label: "---------".to_owned(),
        selected: values.group.is_none(),
    }];
    choices.extend(groups.iter().map(|g| Choice {
        value: g.id.to_string(),
        label: g.title.clone(),
        selected: values.group == Some(g.id),
    }));

    let mut image = FormField::file("image", "Картинка").optional();
    if let Some(current) = &values.current_image {
        image = image.value(current);
    }

    vec![
        FormField::textarea("text", PostText::LABEL)
            .help(PostText::HELP_TEXT)
            .value(&values.text),
        FormField::select("group", "Группа", choices)
            .help("Выберите группу")
            .optional(),
        image,
    ]
}

// ---------------------------------------------------------------------------
// Comment form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentSubmission {
    #[serde(default)]
    pub text: String,
}

impl CommentSubmission {
    pub fn validate(&self) -> Result<CommentText, FormErrors> {
        CommentText::new(&self.text).map_err(|e| {
            let mut errors = FormErrors::default();
            errors.add_validation("text", &e);
            errors
        })
    }
}

pub fn comment_fields() -> Vec<FormField> {
    vec![FormField::textarea("text", CommentText::LABEL)]
}

// ---------------------------------------------------------------------------
// Account forms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupSubmission {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

/// A signup form that passed validation
#[derive(Debug, Clone)]
pub struct ValidSignup {
    pub username: Username,
    pub password: Password,
}

impl SignupSubmission {
    pub fn validate(&self) -> Result<ValidSignup, FormErrors> {
        let mut errors = FormErrors::default();

        let username = Username::new(&self.username)
            .map_err(|e| errors.add_validation("username", &e))
            .ok();

        if self.password1.is_empty() {
            errors.add("password1", MSG_REQUIRED);
        }
        let password = if self.password2.is_empty() {
            errors.add("password2", MSG_REQUIRED);
            None
        } else if self.password1.is_empty() {
            None
        } else {
            Password::new(&self.password1, &self.password2)
                .map_err(|e| errors.add_validation("password2", &e))
                .ok()
        };

        let email = self.email.trim();
        if !email.is_empty() && !looks_like_email(email) {
            errors.add("email", "Введите правильный адрес электронной почты.");
        }

        match (username, password) {
            (Some(username), Some(password)) if errors.is_empty() => {
                Ok(ValidSignup { username, password })
            }
            _ => Err(errors),
        }
    }

    pub fn fields(&self) -> Vec<FormField> {
        signup_fields()
            .into_iter()
            .map(|f| match f.name {
                "first_name" => f.value(&self.first_name),
                "last_name" => f.value(&self.last_name),
                "username" => f.value(&self.username),
                "email" => f.value(&self.email),
                _ => f,
            })
            .collect()
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

pub fn signup_fields() -> Vec<FormField> {
    vec![
        FormField::text("first_name", "Имя").optional(),
        FormField::text("last_name", "Фамилия").optional(),
        FormField::text("username", "Имя пользователя")
            .help("Обязательное поле. Не более 150 символов. Только буквы, цифры и символы @/./+/-/_."),
        FormField::email("email", "Адрес электронной почты").optional(),
        FormField::password("password1", "Пароль"),
        FormField::password("password2", "Подтверждение пароля")
            .help("Для подтверждения введите, пожалуйста, пароль ещё раз."),
    ]
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginSubmission {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginSubmission {
    /// Both fields present; credentials are checked by the caller.
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        if self.username.trim().is_empty() {
            errors.add("username", MSG_REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", MSG_REQUIRED);
        }
        errors.into_result(|| ())
    }
}

pub fn login_fields(username: &str) -> Vec<FormField> {
    vec![
        FormField::text("username", "Имя пользователя").value(username),
        FormField::password("password", "Пароль"),
    ]
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordChangeSubmission {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password1: String,
    #[serde(default)]
    pub new_password2: String,
}

impl PasswordChangeSubmission {
    /// Check the new password. The old one is verified by the caller.
    pub fn validate(&self) -> Result<Password, FormErrors> {
        let mut errors = FormErrors::default();
        if self.old_password.is_empty() {
            errors.add("old_password", MSG_REQUIRED);
        }
        if self.new_password1.is_empty() {
            errors.add("new_password1", MSG_REQUIRED);
        }
        if self.new_password2.is_empty() {
            errors.add("new_password2", MSG_REQUIRED);
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        Password::new(&self.new_password1, &self.new_password2).map_err(|e| {
            errors.add_validation("new_password2", &e);
            errors
        })
    }
}

pub fn password_change_fields() -> Vec<FormField> {
    vec![
        FormField::password("old_password", "Старый пароль"),
        FormField::password("new_password1", "Новый пароль")
            .help("Пароль должен содержать как минимум 8 символов и не может состоять только из цифр."),
        FormField::password("new_password2", "Подтверждение нового пароля"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::samples::SMALL_GIF;

    fn groups() -> Vec<Group> {
        vec![Group {
            id: 7,
            title: "Коты".into(),
            slug: "cats".into(),
            description: String::new(),
        }]
    }

    #[test]
    fn post_requires_text() {
        let submission = PostSubmission {
            text: "   ".into(),
            ..Default::default()
        };
        let errors = submission.validate(&groups()).unwrap_err();
        assert_eq!(errors.get("text"), [MSG_REQUIRED]);
    }

    #[test]
    fn post_group_must_exist() {
        let submission = PostSubmission {
            text: "hello".into(),
            group: "99".into(),
            ..Default::default()
        };
        let errors = submission.validate(&groups()).unwrap_err();
        assert_eq!(errors.get("group"), [MSG_INVALID_CHOICE]);

        let ok = PostSubmission {
            text: "hello".into(),
            group: "7".into(),
            ..Default::default()
        }
        .validate(&groups())
        .unwrap();
        assert_eq!(ok.group_id, Some(7));
    }

    #[test]
    fn post_image_is_sniffed() {
        let bad = PostSubmission {
            text: "hello".into(),
            image: Some(Upload {
                filename: "notes.gif".into(),
                bytes: b"not an image".to_vec(),
            }),
            ..Default::default()
        };
        assert_eq!(
            bad.validate(&groups()).unwrap_err().get("image"),
            [MSG_INVALID_IMAGE]
        );

        let good = PostSubmission {
            text: "hello".into(),
            image: Some(Upload {
                filename: "small.gif".into(),
                bytes: SMALL_GIF.to_vec(),
            }),
            ..Default::default()
        };
        let valid = good.validate(&groups()).unwrap();
        assert_eq!(valid.image.unwrap().0, ImageKind::Gif);
    }

    #[test]
    fn post_image_and_clear_contradict() {
        let submission = PostSubmission {
            text: "hello".into(),
            image: Some(Upload {
                filename: "small.gif".into(),
                bytes: SMALL_GIF.to_vec(),
            }),
            image_clear: true,
            ..Default::default()
        };
        let errors = submission.validate(&groups()).unwrap_err();
        assert_eq!(errors.get("image"), [MSG_IMAGE_CONTRADICTION]);

        let clear_only = PostSubmission {
            text: "hello".into(),
            image_clear: true,
            ..Default::default()
        };
        assert!(clear_only.validate(&groups()).unwrap().image_clear);
    }

    #[test]
    fn post_fields_mark_selected_group() {
        let values = PostFormValues {
            text: "draft".into(),
            group: Some(7),
            current_image: None,
        };
        let fields = post_fields(&groups(), &values);
        let view = FormView::unbound(fields);

        let text = view.field("text").unwrap();
        assert_eq!(text.label, "текст");
        assert_eq!(text.help_text, "Введите текст новой записи");
        assert_eq!(text.value, "draft");

        let group = view.field("group").unwrap();
        assert!(!group.required);
        assert!(group.choices.iter().any(|c| c.value == "7" && c.selected));
    }

    #[test]
    fn bound_view_attaches_errors() {
        let mut errors = FormErrors::default();
        errors.add("text", MSG_REQUIRED);
        errors.add(FormErrors::NON_FIELD, MSG_BAD_CREDENTIALS);

        let view = FormView::bound(comment_fields(), &errors);
        assert!(view.is_bound);
        assert_eq!(view.field("text").unwrap().errors, [MSG_REQUIRED]);
        assert_eq!(view.non_field_errors, [MSG_BAD_CREDENTIALS]);
    }

    #[test]
    fn signup_checks_passwords_and_username() {
        let submission = SignupSubmission {
            username: "has space".into(),
            password1: "correct-horse".into(),
            password2: "correct-horsf".into(),
            ..Default::default()
        };
        let errors = submission.validate().unwrap_err();
        assert_eq!(errors.get("username").len(), 1);
        assert_eq!(errors.get("password2"), ["Введенные пароли не совпадают."]);

        let ok = SignupSubmission {
            username: "leo".into(),
            email: "leo@example.com".into(),
            password1: "correct-horse".into(),
            password2: "correct-horse".into(),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(ok.username.as_str(), "leo");
    }

    #[test]
    fn signup_rejects_bad_email() {
        let submission = SignupSubmission {
            username: "leo".into(),
            email: "not-an-email".into(),
            password1: "correct-horse".into(),
            password2: "correct-horse".into(),
            ..Default::default()
        };
        assert_eq!(submission.validate().unwrap_err().get("email").len(), 1);
    }

    #[test]
    fn password_change_requires_all_fields() {
        let errors = PasswordChangeSubmission::default().validate().unwrap_err();
        assert_eq!(errors.get("old_password"), [MSG_REQUIRED]);
        assert_eq!(errors.get("new_password1"), [MSG_REQUIRED]);
        assert_eq!(errors.get("new_password2"), [MSG_REQUIRED]);
    }

    #[test]
    fn password_change_rejects_numeric() {
        let submission = PasswordChangeSubmission {
            old_password: "whatever1".into(),
            new_password1: "12345678".into(),
            new_password2: "12345678".into(),
        };
        assert_eq!(
            submission.validate().unwrap_err().get("new_password2"),
            ["Введённый пароль состоит только из цифр."]
        );
    }
}
