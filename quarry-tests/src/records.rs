use quarry_core::{FieldDef, Model, ModelBuilder, Record, Result, RowLabeled, Value};
use std::mem::offset_of;
use time::OffsetDateTime;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub books: Vec<Book>,
    pub profile: Option<Profile>,
}

impl Author {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }
    pub fn set_books(&mut self, books: Vec<Book>) {
        self.books = books;
    }
    pub fn set_profile(&mut self, profile: Option<Profile>) {
        self.profile = profile;
    }
}

impl Record for Author {
    fn describe() -> Model {
        ModelBuilder::new("authors")
            .field(
                FieldDef::new::<i64>("id")
                    .primary_key()
                    .auto_increment()
                    .offset(offset_of!(Author, id)),
            )
            .field(
                FieldDef::new::<String>("name")
                    .unique()
                    .offset(offset_of!(Author, name)),
            )
            .build()
    }
    fn value(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.clone().into()),
            _ => None,
        }
    }
    fn from_row(row: &RowLabeled) -> Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            ..Default::default()
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Profile {
    pub id: i64,
    pub author_id: i64,
    pub bio: String,
}

impl Record for Profile {
    fn describe() -> Model {
        ModelBuilder::new("profiles")
            .field(FieldDef::new::<i64>("id").primary_key().auto_increment())
            .field(FieldDef::new::<i64>("author_id").unique())
            .field(FieldDef::new::<String>("bio").default(""))
            .foreign_key("author_id", "authors", "id")
            .build()
    }
    fn value(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.into()),
            "author_id" => Some(self.author_id.into()),
            "bio" => Some(self.bio.clone().into()),
            _ => None,
        }
    }
    fn from_row(row: &RowLabeled) -> Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            author_id: row.get("author_id")?,
            bio: row.get("bio")?,
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Publisher {
    pub id: i64,
    pub name: String,
}

impl Record for Publisher {
    fn describe() -> Model {
        ModelBuilder::new("publishers")
            .field(FieldDef::new::<i64>("id").primary_key())
            .field(FieldDef::new::<String>("name"))
            .build()
    }
    fn value(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.clone().into()),
            _ => None,
        }
    }
    fn from_row(row: &RowLabeled) -> Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Book {
    pub id: i64,
    pub author_id: i64,
    pub publisher_id: Option<i64>,
    pub title: String,
    pub price: Option<f64>,
    pub publisher: Option<Publisher>,
    pub tags: Vec<Tag>,
    pub comments: Vec<Comment>,
}

impl Book {
    pub fn new(id: i64, author_id: i64, title: &str) -> Self {
        Self {
            id,
            author_id,
            title: title.into(),
            ..Default::default()
        }
    }
    pub fn set_publisher(&mut self, publisher: Option<Publisher>) {
        self.publisher = publisher;
    }
    pub fn set_tags(&mut self, tags: Vec<Tag>) {
        self.tags = tags;
    }
    pub fn set_comments(&mut self, comments: Vec<Comment>) {
        self.comments = comments;
    }
}

impl Record for Book {
    fn describe() -> Model {
        ModelBuilder::new("books")
            .field(
                FieldDef::new::<i64>("id")
                    .primary_key()
                    .auto_increment()
                    .offset(offset_of!(Book, id)),
            )
            .field(FieldDef::new::<i64>("author_id").offset(offset_of!(Book, author_id)))
            .field(
                FieldDef::new::<Option<i64>>("publisher_id")
                    .nullable()
                    .offset(offset_of!(Book, publisher_id)),
            )
            .field(FieldDef::new::<String>("title").offset(offset_of!(Book, title)))
            .field(
                FieldDef::new::<Option<f64>>("price")
                    .nullable()
                    .offset(offset_of!(Book, price)),
            )
            .index("books_author", &["author_id"])
            .unique_index("books_title", &["author_id", "title"])
            .foreign_key("author_id", "authors", "id")
            .build()
    }
    fn value(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.into()),
            "author_id" => Some(self.author_id.into()),
            "publisher_id" => Some(self.publisher_id.into()),
            "title" => Some(self.title.clone().into()),
            "price" => Some(self.price.into()),
            _ => None,
        }
    }
    fn from_row(row: &RowLabeled) -> Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            author_id: row.get("author_id")?,
            publisher_id: row.get("publisher_id")?,
            title: row.get("title")?,
            price: row.get("price")?,
            ..Default::default()
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub label: String,
}

impl Record for Tag {
    fn describe() -> Model {
        ModelBuilder::new("tags")
            .field(FieldDef::new::<i64>("id").primary_key())
            .field(FieldDef::new::<String>("label"))
            .unique_index("tags_label", &["label"])
            .build()
    }
    fn value(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.into()),
            "label" => Some(self.label.clone().into()),
            _ => None,
        }
    }
    fn from_row(row: &RowLabeled) -> Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            label: row.get("label")?,
        })
    }
}

/// Join table of [`Book`] and [`Tag`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BookTag {
    pub book_id: i64,
    pub tag_id: i64,
}

impl Record for BookTag {
    fn describe() -> Model {
        ModelBuilder::new("book_tags")
            .field(FieldDef::new::<i64>("book_id").primary_key())
            .field(FieldDef::new::<i64>("tag_id").primary_key())
            .foreign_key("book_id", "books", "id")
            .foreign_key("tag_id", "tags", "id")
            .build()
    }
    fn value(&self, field: &str) -> Option<Value> {
        match field {
            "book_id" => Some(self.book_id.into()),
            "tag_id" => Some(self.tag_id.into()),
            _ => None,
        }
    }
    fn from_row(row: &RowLabeled) -> Result<Self> {
        Ok(Self {
            book_id: row.get("book_id")?,
            tag_id: row.get("tag_id")?,
        })
    }
}

/// Soft deleted through `deleted_at`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub book_id: i64,
    pub body: String,
    pub deleted_at: Option<OffsetDateTime>,
}

impl Record for Comment {
    fn describe() -> Model {
        ModelBuilder::new("comments")
            .field(FieldDef::new::<i64>("id").primary_key().auto_increment())
            .field(FieldDef::new::<i64>("book_id"))
            .field(FieldDef::new::<String>("body"))
            .field(FieldDef::new::<Option<OffsetDateTime>>("deleted_at").soft_delete())
            .build()
    }
    fn value(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.into()),
            "book_id" => Some(self.book_id.into()),
            "body" => Some(self.body.clone().into()),
            "deleted_at" => Some(self.deleted_at.into()),
            _ => None,
        }
    }
    fn from_row(row: &RowLabeled) -> Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            book_id: row.get("book_id")?,
            body: row.get("body")?,
            deleted_at: row.get("deleted_at")?,
        })
    }
}
